use common::config::components::global::StackConfig;
use common::config::loader::read_config;
use common::error::StackError;
use resources::storage::LifecycleRule;
use resources::Address;
use serde_json::Value;
use stack_core::builder::{build_stack, StackBuilder};
use stack_core::Stack;
use std::time::Duration;
use tempfile::TempDir;
use test_utils::{write_fixture_project, FIXTURE_STACK_YML};

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init()
        .ok();
}

fn load(yml: &str) -> (TempDir, StackConfig) {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let root = write_fixture_project(dir.path(), yml).expect("write fixture project");
    let config = read_config(Some(root)).expect("fixture config should load");
    (dir, config)
}

fn build(yml: &str) -> (TempDir, Stack) {
    let (dir, config) = load(yml);
    let stack = build_stack(&config).expect("stack should build");
    (dir, stack)
}

fn body<'a>(stack: &'a Stack, kind: &str, name: &str) -> &'a Value {
    &stack
        .node(&Address::resource(kind, name))
        .unwrap_or_else(|| panic!("{kind}.{name} should be declared"))
        .body
}

fn env<'a>(function: &'a Value, key: &str) -> Option<&'a str> {
    function["service_config"]["environment_variables"][key].as_str()
}

#[test]
fn every_reference_resolves_to_an_earlier_node() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    stack.graph.verify_closure().expect("graph should be closed");

    for node in stack.graph.declaration_order() {
        for dep in &node.relations {
            assert!(
                stack.graph.declared_before(dep, &node.address),
                "{} must be declared before {}",
                dep,
                node.address
            );
        }
    }
    stack.graph.toposort().expect("graph should be acyclic");
}

#[test]
fn provider_is_the_first_node() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let order = stack.graph.declaration_order();
    assert_eq!(order[0].address.to_string(), "provider.google");
    assert_eq!(order[0].body["project"], "cautious-guacamole-381604");
    assert_eq!(order[0].body["region"], "us-central1");
}

#[test]
fn declaring_before_the_provider_fails() {
    let (_dir, config) = load(FIXTURE_STACK_YML);
    let mut builder = StackBuilder::new(&config);
    let err = builder.declare_storage().unwrap_err();
    let StackError::Build { context, .. } = &err else {
        panic!("expected a build error, got {err:?}");
    };
    // Location is the builder call site.
    assert!(
        context.location().file().ends_with("builder.rs"),
        "unexpected location {}",
        context.location()
    );
}

#[test]
fn service_accounts_precede_their_bindings() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let mut bindings = 0;
    for node in stack.graph.declaration_order() {
        if !node.address.kind.ends_with("_iam_member") {
            continue;
        }
        bindings += 1;
        for dep in node
            .relations
            .iter()
            .filter(|a| a.kind == "google_service_account")
        {
            assert!(stack.graph.declared_before(dep, &node.address));
        }
    }
    // secret accessor, getter publisher, transformer publisher, scheduler
    // invoker, pubsub agent
    assert_eq!(bindings, 5);
}

#[test]
fn topics_precede_the_functions_that_use_them() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let queue = Address::resource("google_pubsub_topic", "transformer_queue");
    let bridge = Address::resource("google_pubsub_topic", "big_query_queue");
    let getter = Address::resource("google_cloudfunctions2_function", "weather_getter");
    let transformer = Address::resource("google_cloudfunctions2_function", "transformer");

    assert!(stack.graph.declared_before(&queue, &getter));
    assert!(stack.graph.declared_before(&queue, &transformer));
    assert!(stack.graph.declared_before(&bridge, &transformer));
    assert!(stack.node(&transformer).unwrap().relations.contains(&queue));
    assert!(stack.node(&transformer).unwrap().relations.contains(&bridge));
}

#[test]
fn single_city_scenario_sets_city_and_queue() {
    let yml = FIXTURE_STACK_YML.replace(
        "project: cautious-guacamole-381604",
        "project: p",
    );
    let (_dir, stack) = build(&yml);
    let getter = body(&stack, "google_cloudfunctions2_function", "weather_getter");

    assert_eq!(env(getter, "CITY"), Some("Tokyo"));
    assert_eq!(env(getter, "CITIES"), Some("Tokyo"));
    assert_eq!(env(getter, "PROJECT_ID"), Some("p"));
    assert_eq!(
        env(getter, "TRANSFORMER_QUEUE"),
        Some("${google_pubsub_topic.transformer_queue.name}")
    );

    let secret_env = &getter["service_config"]["secret_environment_variables"][0];
    assert_eq!(secret_env["key"], "OPEN_WEATHER_API_KEY");
    assert_eq!(secret_env["project_id"], "p");
    assert_eq!(
        secret_env["secret"],
        "${google_secret_manager_secret.open_weather_secret.secret_id}"
    );
    assert_eq!(secret_env["version"], "2");

    assert_eq!(getter["build_config"]["entry_point"], "GetWeather");
    assert_eq!(getter["service_config"]["min_instance_count"], 0);
    assert_eq!(getter["service_config"]["max_instance_count"], 1);
    assert!(getter.get("event_trigger").is_none());

    let bucket = body(&stack, "google_storage_bucket", "asset_bucket");
    assert_eq!(bucket["name"], "asset-bucket-p");
}

#[test]
fn several_cities_only_set_cities() {
    let yml = FIXTURE_STACK_YML.replace("  - Tokyo\n", "  - Tokyo\n  - Osaka\n");
    let (_dir, stack) = build(&yml);
    let getter = body(&stack, "google_cloudfunctions2_function", "weather_getter");
    assert_eq!(env(getter, "CITIES"), Some("Tokyo,Osaka"));
    assert_eq!(env(getter, "CITY"), None);
}

#[test]
fn configured_text_is_emitted_verbatim() {
    let yml = FIXTURE_STACK_YML
        .replace("  - Tokyo\n", "  - \"${foo.bar}\"\n")
        .replace("  version: \"2\"\n", "  version: \"2\"\n  placeholder: \"pa${ss}%{x}\"\n");
    let (_dir, stack) = build(&yml);
    stack.graph.verify_closure().expect("graph should be closed");

    let getter = body(&stack, "google_cloudfunctions2_function", "weather_getter");
    assert_eq!(env(getter, "CITY"), Some("$${foo.bar}"));
    assert_eq!(env(getter, "CITIES"), Some("$${foo.bar}"));
    let getter_node = stack
        .node(&Address::resource("google_cloudfunctions2_function", "weather_getter"))
        .unwrap();
    assert!(!getter_node
        .relations
        .iter()
        .any(|a| a.to_string() == "foo.bar"));

    let version = body(
        &stack,
        "google_secret_manager_secret_version",
        "open_weather_secret_version",
    );
    assert_eq!(version["secret_data"], "pa$${ss}%%{x}");
}

#[test]
fn transformer_is_triggered_by_the_queue() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let transformer = body(&stack, "google_cloudfunctions2_function", "transformer");
    let trigger = &transformer["event_trigger"];
    assert_eq!(
        trigger["event_type"],
        "google.cloud.pubsub.topic.v1.messagePublished"
    );
    assert_eq!(
        trigger["pubsub_topic"],
        "${google_pubsub_topic.transformer_queue.id}"
    );
    assert_eq!(trigger["retry_policy"], "RETRY_POLICY_DO_NOT_RETRY");
    assert_eq!(transformer["build_config"]["entry_point"], "Transform");
    assert_eq!(
        env(transformer, "BIG_QUERY_QUEUE"),
        Some("${google_pubsub_topic.big_query_queue.name}")
    );
}

#[test]
fn table_schema_has_ten_weather_columns() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let table = body(&stack, "google_bigquery_table", "weather_table");
    assert_eq!(
        table["dataset_id"],
        "${google_bigquery_dataset.weather_dataset.dataset_id}"
    );
    assert_eq!(table["table_id"], "weather_table");
    assert_eq!(table["deletion_protection"], false);

    let schema: Vec<Value> =
        serde_json::from_str(table["schema"].as_str().expect("schema is a string"))
            .expect("schema is valid json");
    let pairs = schema
        .iter()
        .map(|c| {
            (
                c["name"].as_str().unwrap().to_string(),
                c["type"].as_str().unwrap().to_string(),
            )
        })
        .collect::<Vec<_>>();
    let expected = [
        ("longitude", "FLOAT64"),
        ("latitude", "FLOAT64"),
        ("weather_main", "STRING"),
        ("weather_description", "STRING"),
        ("temperature", "FLOAT64"),
        ("temperature_min", "FLOAT64"),
        ("temperature_max", "FLOAT64"),
        ("pressure", "INT64"),
        ("humidity", "INT64"),
        ("name", "STRING"),
    ];
    assert_eq!(pairs.len(), 10);
    for ((name, ty), (exp_name, exp_ty)) in pairs.iter().zip(expected) {
        assert_eq!(name, exp_name);
        assert_eq!(ty, exp_ty);
    }
}

#[test]
fn bucket_purges_objects_after_one_day() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let bucket = body(&stack, "google_storage_bucket", "asset_bucket");
    assert_eq!(bucket["location"], "us-central1");
    assert_eq!(bucket["force_destroy"], true);
    assert_eq!(bucket["lifecycle_rule"][0]["action"]["type"], "Delete");
    assert_eq!(bucket["lifecycle_rule"][0]["condition"]["age"], 1);

    let rule = LifecycleRule::delete_after_days(1);
    assert!(rule.is_eligible(Duration::from_secs(86_400)));
    assert!(rule.is_eligible(Duration::from_secs(3 * 86_400)));
    assert!(!rule.is_eligible(Duration::from_secs(86_399)));
}

#[test]
fn source_objects_are_named_by_content_hash() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    for id in ["weather_getter", "transformer"] {
        let asset = stack.asset(id).expect("asset is recorded");
        let object = body(&stack, "google_storage_bucket_object", &format!("{id}_source"));
        assert_eq!(object["name"], format!("{}.zip", asset.hash));
        assert_eq!(object["bucket"], "${google_storage_bucket.asset_bucket.name}");
        assert_eq!(
            object["source"],
            format!("assets/{id}/{}.zip", asset.hash)
        );

        let function = body(&stack, "google_cloudfunctions2_function", id);
        assert_eq!(
            function["build_config"]["source"]["storage_source"]["object"],
            format!("${{google_storage_bucket_object.{id}_source.name}}")
        );
    }
    assert_ne!(
        stack.asset("weather_getter").unwrap().hash,
        stack.asset("transformer").unwrap().hash
    );
}

#[test]
fn grants_are_scoped_to_single_resources() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);

    let accessor = body(
        &stack,
        "google_secret_manager_secret_iam_member",
        "weather_getter_secret_accessor",
    );
    assert_eq!(accessor["role"], "roles/secretmanager.secretAccessor");
    assert_eq!(
        accessor["member"],
        "serviceAccount:${google_service_account.weather_getter_runner.email}"
    );

    let publisher = body(&stack, "google_pubsub_topic_iam_member", "weather_getter_publisher");
    assert_eq!(publisher["role"], "roles/pubsub.publisher");
    assert_eq!(publisher["topic"], "${google_pubsub_topic.transformer_queue.name}");

    let transformer = body(&stack, "google_pubsub_topic_iam_member", "transformer_publisher");
    assert_eq!(transformer["topic"], "${google_pubsub_topic.big_query_queue.name}");

    let agent = body(&stack, "google_bigquery_dataset_iam_member", "pubsub_agent_data_editor");
    assert_eq!(agent["role"], "roles/bigquery.dataEditor");
    assert_eq!(
        agent["member"],
        "serviceAccount:service-${data.google_project.project.number}@gcp-sa-pubsub.iam.gserviceaccount.com"
    );
}

#[test]
fn schedule_is_declared_after_its_invoker_grant() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let grant = Address::resource("google_cloud_run_service_iam_member", "scheduler_run_invoker");
    let job = Address::resource("google_cloud_scheduler_job", "scheduler");

    assert!(stack.graph.declared_before(&grant, &job));
    let job_node = stack.node(&job).unwrap();
    assert_eq!(job_node.depends_on, vec![grant.clone()]);

    let grant_body = &stack.node(&grant).unwrap().body;
    assert_eq!(grant_body["role"], "roles/run.invoker");
    assert_eq!(
        grant_body["service"],
        "${google_cloudfunctions2_function.weather_getter.name}"
    );

    let target = &job_node.body["http_target"];
    let uri = "${google_cloudfunctions2_function.weather_getter.service_config[0].uri}";
    assert_eq!(target["uri"], uri);
    assert_eq!(target["http_method"], "POST");
    assert_eq!(target["oidc_token"]["audience"], uri);
    assert_eq!(
        target["oidc_token"]["service_account_email"],
        "${google_service_account.scheduler_invoker.email}"
    );
    assert_eq!(job_node.body["schedule"], "* * * * *");
    assert_eq!(job_node.body["time_zone"], "Etc/UTC");
}

#[test]
fn schedule_without_oidc_has_no_invoker() {
    let yml = FIXTURE_STACK_YML.replace(
        "  cron: \"* * * * *\"\n",
        "  cron: \"* * * * *\"\n  oidc: false\n",
    );
    let (_dir, stack) = build(&yml);
    let job = body(&stack, "google_cloud_scheduler_job", "scheduler");
    assert!(job["http_target"].get("oidc_token").is_none());
    assert!(stack
        .node(&Address::resource("google_service_account", "scheduler_invoker"))
        .is_none());
    assert!(stack
        .node(&Address::resource("google_cloud_scheduler_job", "scheduler"))
        .unwrap()
        .depends_on
        .is_empty());
}

#[test]
fn bridge_subscription_writes_into_the_table() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let sub = Address::resource("google_pubsub_subscription", "big_query_subscription");
    let node = stack.node(&sub).expect("subscription declared");

    assert_eq!(node.body["topic"], "${google_pubsub_topic.big_query_queue.id}");
    assert_eq!(
        node.body["bigquery_config"]["table"],
        "cautious-guacamole-381604.${google_bigquery_dataset.weather_dataset.dataset_id}.${google_bigquery_table.weather_table.table_id}"
    );
    assert_eq!(node.body["bigquery_config"]["write_metadata"], false);
    assert_eq!(
        node.depends_on,
        vec![Address::resource(
            "google_bigquery_dataset_iam_member",
            "pubsub_agent_data_editor"
        )]
    );
}

#[test]
fn direct_insert_sink_skips_the_bridge() {
    let yml = FIXTURE_STACK_YML.replace("sink: topic_bridge", "sink: direct_insert");
    let (_dir, stack) = build(&yml);

    assert!(stack
        .node(&Address::resource("google_pubsub_topic", "big_query_queue"))
        .is_none());
    assert!(stack
        .node(&Address::resource("google_pubsub_subscription", "big_query_subscription"))
        .is_none());
    assert!(stack
        .node(&Address::data("google_project", "project"))
        .is_none());

    let transformer = body(&stack, "google_cloudfunctions2_function", "transformer");
    assert_eq!(env(transformer, "BIG_QUERY_QUEUE"), None);
    assert_eq!(env(transformer, "PROJECT_ID"), Some("cautious-guacamole-381604"));
    assert_eq!(
        env(transformer, "BIG_QUERY_DATASET"),
        Some("${google_bigquery_dataset.weather_dataset.dataset_id}")
    );
    assert_eq!(
        env(transformer, "BIG_QUERY_TABLE"),
        Some("${google_bigquery_table.weather_table.table_id}")
    );

    let grant = body(&stack, "google_bigquery_dataset_iam_member", "transformer_data_editor");
    assert_eq!(grant["role"], "roles/bigquery.dataEditor");
    assert_eq!(
        grant["member"],
        "serviceAccount:${google_service_account.transformer_runner.email}"
    );
    stack.graph.verify_closure().unwrap();
}

#[test]
fn build_trigger_follows_the_repository() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let trigger = body(&stack, "google_cloudbuild_trigger", "build_trigger");
    assert_eq!(trigger["filename"], "cloudbuild.yaml");
    assert_eq!(trigger["github"]["owner"], "hsmtkk");
    assert_eq!(trigger["github"]["name"], "cautious-guacamole");
    assert_eq!(trigger["github"]["push"]["branch"], ".*");

    let yml = FIXTURE_STACK_YML.replace(
        "repository:\n  owner: hsmtkk\n  name: cautious-guacamole\n",
        "",
    );
    let (_dir, stack) = build(&yml);
    assert!(stack
        .node(&Address::resource("google_cloudbuild_trigger", "build_trigger"))
        .is_none());
}

#[test]
fn terraform_document_groups_blocks() {
    let (_dir, stack) = build(FIXTURE_STACK_YML);
    let doc = stack.to_terraform_json().unwrap();

    assert_eq!(
        doc["terraform"]["required_providers"]["google"]["source"],
        "hashicorp/google"
    );
    assert_eq!(
        doc["terraform"]["backend"]["gcs"]["bucket"],
        "cautious-guacamole-381604-tfstate"
    );
    assert_eq!(doc["terraform"]["backend"]["gcs"]["prefix"], "weather-stack");
    assert_eq!(doc["provider"]["google"][0]["project"], "cautious-guacamole-381604");
    assert_eq!(doc["data"]["google_project"]["project"]["project_id"], "cautious-guacamole-381604");

    let topic = &doc["resource"]["google_pubsub_topic"]["transformer_queue"];
    assert_eq!(topic["name"], "transformer-queue");
    assert_eq!(topic["//"]["metadata"]["path"], "weather-stack/transformer_queue");
    assert_eq!(
        doc["resource"]["google_cloud_scheduler_job"]["scheduler"]["depends_on"][0],
        "google_cloud_run_service_iam_member.scheduler_run_invoker"
    );

    assert_eq!(
        doc["output"]["weather_getter_uri"]["value"],
        "${google_cloudfunctions2_function.weather_getter.service_config[0].uri}"
    );
    assert_eq!(
        doc["output"]["asset_bucket"]["value"],
        "${google_storage_bucket.asset_bucket.name}"
    );
}
