use crate::asset::FunctionAsset;
use crate::stack::{Output, Stack};
use common::config::components::functions::ResolvedFunction;
use common::config::components::global::StackConfig;
use common::config::components::warehouse::SinkMode;
use common::config::validate::scheduler_account_id;
use common::error::StackError;
use dag::references::extract_references;
use dag::ResourceGraph;
use log::{debug, info};
use resources::build::{CloudbuildTrigger, GithubEventsConfig, PushFilter};
use resources::functions::{
    BuildConfig, CloudFunction, EventTrigger, FunctionSource, SecretEnvironmentVariable,
    ServiceConfig, StorageSource, SERVICE_ATTRIBUTE, URI_ATTRIBUTE,
};
use resources::iam::{
    pubsub_service_agent_member, service_account_member, IamMember, IamScope, ServiceAccount,
    ROLE_BIGQUERY_DATA_EDITOR, ROLE_PUBSUB_PUBLISHER, ROLE_RUN_INVOKER, ROLE_SECRET_ACCESSOR,
};
use resources::project::ProjectData;
use resources::provider::{GcsBackend, GoogleProvider, RequiredProvider};
use resources::pubsub::{BigqueryConfig, PubsubSubscription, PubsubTopic};
use resources::scheduler::{CloudSchedulerJob, HttpTarget};
use resources::secrets::{SecretManagerSecret, SecretManagerSecretVersion};
use resources::storage::{StorageBucket, StorageBucketObject};
use resources::warehouse::{weather_columns, BigqueryDataset, BigqueryTable};
use resources::{literal, Address, Declare};
use std::collections::BTreeMap;

pub const WEATHER_GETTER_ID: &str = "weather_getter";
pub const TRANSFORMER_ID: &str = "transformer";

pub const ENV_CITY: &str = "CITY";
pub const ENV_CITIES: &str = "CITIES";
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub const ENV_TRANSFORMER_QUEUE: &str = "TRANSFORMER_QUEUE";
pub const ENV_BIG_QUERY_QUEUE: &str = "BIG_QUERY_QUEUE";
pub const ENV_BIG_QUERY_DATASET: &str = "BIG_QUERY_DATASET";
pub const ENV_BIG_QUERY_TABLE: &str = "BIG_QUERY_TABLE";

pub const OUTPUT_WEATHER_GETTER_URI: &str = "weather_getter_uri";
pub const OUTPUT_ASSET_BUCKET: &str = "asset_bucket";

const SCHEDULER_ATTEMPT_DEADLINE: &str = "320s";

#[derive(Debug, Clone)]
pub struct FunctionObjects {
    pub weather_getter: Address,
    pub transformer: Address,
}

#[derive(Debug, Clone)]
pub struct Topics {
    pub transformer_queue: Address,
    /// Only declared for [`SinkMode::TopicBridge`].
    pub bridge: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct Secrets {
    pub secret: Address,
    pub version: Address,
}

#[derive(Debug, Clone)]
pub struct Warehouse {
    pub dataset: Address,
    pub table: Address,
}

#[derive(Debug, Clone)]
pub struct Identities {
    pub weather_getter: Address,
    pub transformer: Address,
    /// Only declared when the schedule signs its requests.
    pub scheduler: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct Grants {
    pub weather_getter_secret: Address,
    pub weather_getter_publisher: Address,
    pub transformer_sink: Address,
}

#[derive(Debug, Clone)]
pub struct Functions {
    pub weather_getter: Address,
    pub transformer: Address,
}

/// Assembles the deployment graph one layer at a time.
///
/// Each step takes the addresses produced by the steps it depends on, so the
/// declaration order is fixed by the call order in [`build_stack`] and every
/// reference is declared before it is used.
pub struct StackBuilder<'a> {
    config: &'a StackConfig,
    graph: ResourceGraph,
    assets: Vec<FunctionAsset>,
    outputs: BTreeMap<String, Output>,
}

impl<'a> StackBuilder<'a> {
    pub fn new(config: &'a StackConfig) -> Self {
        Self {
            config,
            graph: ResourceGraph::new(),
            assets: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    fn declare(
        &mut self,
        id: &str,
        descriptor: &impl Declare,
        depends_on: &[Address],
    ) -> Result<Address, StackError> {
        self.graph
            .declare(&self.config.name, id, descriptor, depends_on)
            .map_err(|e| StackError::build(e))
    }

    pub fn bind_provider(&mut self) -> Result<Address, StackError> {
        let provider = GoogleProvider {
            project: self.config.project.clone(),
            region: self.config.region.clone(),
        };
        self.graph
            .bind_provider(&self.config.name, &provider)
            .map_err(|e| StackError::build(e))
    }

    /// CI trigger on the configured repository; skipped without one.
    pub fn declare_build_trigger(&mut self) -> Result<Option<Address>, StackError> {
        let config = self.config;
        let Some(repository) = &config.repository else {
            debug!("no repository configured, skipping build trigger");
            return Ok(None);
        };
        let trigger = CloudbuildTrigger {
            filename: literal(&repository.build_file),
            github: GithubEventsConfig {
                owner: literal(&repository.owner),
                name: literal(&repository.name),
                push: PushFilter {
                    branch: literal(&repository.branch),
                },
            },
        };
        self.declare("build_trigger", &trigger, &[]).map(Some)
    }

    pub fn declare_storage(&mut self) -> Result<Address, StackError> {
        let bucket = StorageBucket::for_artifacts(
            &self.config.bucket_name,
            &self.config.region,
            self.config.asset_retention_days,
        );
        let address = self.declare("asset_bucket", &bucket, &[])?;
        self.outputs.insert(
            OUTPUT_ASSET_BUCKET.to_string(),
            Output {
                value: address.attr("name").into(),
                description: "Bucket holding the function source archives".to_string(),
            },
        );
        Ok(address)
    }

    /// Hash each function directory and declare its content-addressed
    /// object. The archives themselves are written at synth time.
    pub fn upload_function_sources(&mut self, bucket: &Address) -> Result<FunctionObjects, StackError> {
        let weather_getter = self.upload_source(WEATHER_GETTER_ID, bucket)?;
        let transformer = self.upload_source(TRANSFORMER_ID, bucket)?;
        Ok(FunctionObjects {
            weather_getter,
            transformer,
        })
    }

    fn upload_source(&mut self, id: &str, bucket: &Address) -> Result<Address, StackError> {
        let function = self.resolved_function(id);
        let asset =
            FunctionAsset::from_dir(id, &function.source_dir).map_err(|e| StackError::build(e))?;
        let object = StorageBucketObject {
            name: asset.object_name(),
            bucket: bucket.attr("name").into(),
            source: asset.relative_archive_path(),
        };
        let address = self.declare(&format!("{id}_source"), &object, &[])?;
        info!("{id}: source hash {}", asset.hash);
        self.assets.push(asset);
        Ok(address)
    }

    pub fn declare_messaging(&mut self) -> Result<Topics, StackError> {
        let transformer_queue = self.declare(
            "transformer_queue",
            &PubsubTopic {
                name: self.config.messaging.transformer_queue.clone(),
            },
            &[],
        )?;
        let bridge = match self.config.warehouse.sink {
            SinkMode::TopicBridge => Some(self.declare(
                "big_query_queue",
                &PubsubTopic {
                    name: self.config.warehouse.bridge_topic.clone(),
                },
                &[],
            )?),
            SinkMode::DirectInsert => None,
        };
        Ok(Topics {
            transformer_queue,
            bridge,
        })
    }

    pub fn declare_secrets(&mut self) -> Result<Secrets, StackError> {
        let secret = self.declare(
            "open_weather_secret",
            &SecretManagerSecret::replicated(&self.config.secret.id),
            &[],
        )?;
        let version = self.declare(
            "open_weather_secret_version",
            &SecretManagerSecretVersion {
                secret: secret.attr("id").into(),
                secret_data: literal(&self.config.secret.placeholder),
            },
            &[],
        )?;
        Ok(Secrets { secret, version })
    }

    pub fn declare_warehouse(&mut self) -> Result<Warehouse, StackError> {
        let config = self.config;
        let warehouse = &config.warehouse;
        let dataset = self.declare(
            "weather_dataset",
            &BigqueryDataset {
                dataset_id: warehouse.dataset.clone(),
                location: config.warehouse_location().to_string(),
            },
            &[],
        )?;
        let table_descriptor = BigqueryTable::with_columns(
            dataset.attr("dataset_id"),
            warehouse.table.clone(),
            &weather_columns(),
        )
        .map_err(|e| StackError::build(e))?;
        let table = self.declare("weather_table", &table_descriptor, &[])?;
        Ok(Warehouse { dataset, table })
    }

    pub fn declare_identities(&mut self) -> Result<Identities, StackError> {
        let weather_getter = self.declare_runner(WEATHER_GETTER_ID)?;
        let transformer = self.declare_runner(TRANSFORMER_ID)?;
        let scheduler = if self.config.schedule.oidc {
            let account = ServiceAccount {
                account_id: scheduler_account_id(&self.config.schedule.name),
                display_name: format!("Invokes {} on schedule", self.config.weather_getter.name),
            };
            Some(self.declare("scheduler_invoker", &account, &[])?)
        } else {
            None
        };
        Ok(Identities {
            weather_getter,
            transformer,
            scheduler,
        })
    }

    fn declare_runner(&mut self, id: &str) -> Result<Address, StackError> {
        let function = self.resolved_function(id);
        let account = ServiceAccount {
            account_id: function.runner_account_id(),
            display_name: format!("Runs {}", function.name),
        };
        self.declare(&format!("{id}_runner"), &account, &[])
    }

    /// Least-privilege grants for the function runners, each scoped to the
    /// single secret, topic or dataset it needs.
    pub fn declare_grants(
        &mut self,
        identities: &Identities,
        topics: &Topics,
        secrets: &Secrets,
        warehouse: &Warehouse,
    ) -> Result<Grants, StackError> {
        let project = self.config.project.clone();

        let weather_getter_member = service_account_member(&identities.weather_getter.attr("email"));
        let weather_getter_secret = self.declare(
            "weather_getter_secret_accessor",
            &IamMember::new(
                ROLE_SECRET_ACCESSOR,
                weather_getter_member.clone(),
                IamScope::Secret {
                    project: project.clone(),
                    secret_id: secrets.secret.attr("secret_id").into(),
                },
            ),
            &[],
        )?;
        let weather_getter_publisher = self.declare(
            "weather_getter_publisher",
            &IamMember::new(
                ROLE_PUBSUB_PUBLISHER,
                weather_getter_member,
                IamScope::Topic {
                    project: project.clone(),
                    topic: topics.transformer_queue.attr("name").into(),
                },
            ),
            &[],
        )?;

        let transformer_member = service_account_member(&identities.transformer.attr("email"));
        let transformer_sink = match &topics.bridge {
            Some(bridge) => self.declare(
                "transformer_publisher",
                &IamMember::new(
                    ROLE_PUBSUB_PUBLISHER,
                    transformer_member,
                    IamScope::Topic {
                        project,
                        topic: bridge.attr("name").into(),
                    },
                ),
                &[],
            )?,
            None => self.declare(
                "transformer_data_editor",
                &IamMember::new(
                    ROLE_BIGQUERY_DATA_EDITOR,
                    transformer_member,
                    IamScope::Dataset {
                        project,
                        dataset_id: warehouse.dataset.attr("dataset_id").into(),
                    },
                ),
                &[],
            )?,
        };

        Ok(Grants {
            weather_getter_secret,
            weather_getter_publisher,
            transformer_sink,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn declare_functions(
        &mut self,
        bucket: &Address,
        objects: &FunctionObjects,
        topics: &Topics,
        secrets: &Secrets,
        warehouse: &Warehouse,
        identities: &Identities,
        grants: &Grants,
    ) -> Result<Functions, StackError> {
        let config = self.config;
        let getter_cfg = &config.weather_getter;

        let mut getter_service = scaled_service(getter_cfg, &identities.weather_getter)
            .with_env(ENV_CITIES, literal(&config.cities.join(",")))
            .with_env(ENV_PROJECT_ID, config.project.clone())
            .with_env(ENV_TRANSFORMER_QUEUE, topics.transformer_queue.attr("name"));
        if let [city] = config.cities.as_slice() {
            getter_service = getter_service.with_env(ENV_CITY, literal(city));
        }
        getter_service.secret_environment_variables.push(SecretEnvironmentVariable {
            key: config.secret.env_key.clone(),
            project_id: config.project.clone(),
            secret: secrets.secret.attr("secret_id").into(),
            version: config.secret.version.clone(),
        });

        let weather_getter = CloudFunction {
            name: getter_cfg.name.clone(),
            location: config.region.clone(),
            description: Some("Fetches current weather for the configured cities".to_string()),
            build_config: build_config(getter_cfg, bucket, &objects.weather_getter),
            service_config: getter_service,
            event_trigger: None,
        };
        // The runner must be able to read the secret before the service can
        // start, and publish before the first invocation.
        let weather_getter = self.declare(
            WEATHER_GETTER_ID,
            &weather_getter,
            &[
                grants.weather_getter_secret.clone(),
                grants.weather_getter_publisher.clone(),
            ],
        )?;

        let transformer_cfg = &config.transformer;
        let mut transformer_service = scaled_service(transformer_cfg, &identities.transformer)
            .with_env(ENV_PROJECT_ID, config.project.clone());
        transformer_service = match &topics.bridge {
            Some(bridge) => transformer_service.with_env(ENV_BIG_QUERY_QUEUE, bridge.attr("name")),
            None => transformer_service
                .with_env(ENV_BIG_QUERY_DATASET, warehouse.dataset.attr("dataset_id"))
                .with_env(ENV_BIG_QUERY_TABLE, warehouse.table.attr("table_id")),
        };

        let transformer = CloudFunction {
            name: transformer_cfg.name.clone(),
            location: config.region.clone(),
            description: Some("Reshapes raw weather messages into warehouse rows".to_string()),
            build_config: build_config(transformer_cfg, bucket, &objects.transformer),
            service_config: transformer_service,
            event_trigger: Some(EventTrigger::on_topic(
                config.region.clone(),
                topics.transformer_queue.attr("id"),
            )),
        };
        let transformer = self.declare(
            TRANSFORMER_ID,
            &transformer,
            &[grants.transformer_sink.clone()],
        )?;

        self.outputs.insert(
            OUTPUT_WEATHER_GETTER_URI.to_string(),
            Output {
                value: weather_getter.attr(URI_ATTRIBUTE).into(),
                description: "HTTPS endpoint of the weather getter".to_string(),
            },
        );

        Ok(Functions {
            weather_getter,
            transformer,
        })
    }

    /// Cron job calling the weather getter. With OIDC the invoker grant is
    /// declared first and the job depends on it.
    pub fn declare_schedule(
        &mut self,
        functions: &Functions,
        identities: &Identities,
    ) -> Result<Address, StackError> {
        let config = self.config;
        let schedule = &config.schedule;
        let uri: String = functions.weather_getter.attr(URI_ATTRIBUTE).into();
        let mut target = HttpTarget::post(uri);
        let mut depends_on = Vec::new();

        if let Some(invoker) = &identities.scheduler {
            let email = invoker.attr("email");
            let grant = self.declare(
                "scheduler_run_invoker",
                &IamMember::new(
                    ROLE_RUN_INVOKER,
                    service_account_member(&email),
                    IamScope::CloudRunService {
                        project: config.project.clone(),
                        location: config.region.clone(),
                        service: functions.weather_getter.attr(SERVICE_ATTRIBUTE).into(),
                    },
                ),
                &[],
            )?;
            target = target.with_oidc(email);
            depends_on.push(grant);
        }

        let job = CloudSchedulerJob {
            name: schedule.name.clone(),
            region: config.region.clone(),
            schedule: schedule.cron.clone(),
            time_zone: literal(&schedule.time_zone),
            attempt_deadline: SCHEDULER_ATTEMPT_DEADLINE.to_string(),
            http_target: target,
        };
        self.declare("scheduler", &job, &depends_on)
    }

    /// BigQuery subscription streaming the bridge topic into the table.
    /// Nothing is declared for [`SinkMode::DirectInsert`].
    pub fn declare_subscription(
        &mut self,
        topics: &Topics,
        warehouse: &Warehouse,
    ) -> Result<Option<Address>, StackError> {
        let Some(bridge) = &topics.bridge else {
            return Ok(None);
        };

        let project = self.declare(
            "project",
            &ProjectData {
                project_id: self.config.project.clone(),
            },
            &[],
        )?;
        let agent_grant = self.declare(
            "pubsub_agent_data_editor",
            &IamMember::new(
                ROLE_BIGQUERY_DATA_EDITOR,
                pubsub_service_agent_member(&project.attr("number")),
                IamScope::Dataset {
                    project: self.config.project.clone(),
                    dataset_id: warehouse.dataset.attr("dataset_id").into(),
                },
            ),
            &[],
        )?;

        let table = format!(
            "{}.{}.{}",
            self.config.project,
            warehouse.dataset.attr("dataset_id"),
            warehouse.table.attr("table_id")
        );
        let subscription = PubsubSubscription {
            name: format!("{}-subscription", self.config.warehouse.bridge_topic),
            topic: bridge.attr("id").into(),
            bigquery_config: Some(BigqueryConfig::into_table(table)),
        };
        self.declare("big_query_subscription", &subscription, &[agent_grant])
            .map(Some)
    }

    /// Verify the graph and hand back the finished stack.
    pub fn finish(self) -> Result<Stack, StackError> {
        self.graph.verify_closure().map_err(|e| StackError::build(e))?;
        for (name, output) in &self.outputs {
            for address in extract_references(&serde_json::Value::String(output.value.clone())) {
                if self.graph.get(&address).is_none() {
                    return Err(StackError::build_msg(format!(
                        "output `{name}` references undeclared `{address}`"
                    )));
                }
            }
        }

        let config = self.config;
        Ok(Stack {
            name: config.name.clone(),
            required_provider: RequiredProvider::google(&config.provider_version),
            backend: GcsBackend {
                bucket: config.state.bucket.clone(),
                prefix: config.state.prefix.clone(),
            },
            graph: self.graph,
            assets: self.assets,
            outputs: self.outputs,
        })
    }

    fn resolved_function(&self, id: &str) -> &'a ResolvedFunction {
        if id == WEATHER_GETTER_ID {
            &self.config.weather_getter
        } else {
            &self.config.transformer
        }
    }
}

fn scaled_service(function: &ResolvedFunction, runner: &Address) -> ServiceConfig {
    let mut service = ServiceConfig::scale_to_zero(
        function.max_instances,
        literal(&function.memory),
        runner.attr("email"),
    );
    service.min_instance_count = function.min_instances;
    service
}

fn build_config(function: &ResolvedFunction, bucket: &Address, object: &Address) -> BuildConfig {
    BuildConfig {
        runtime: literal(&function.runtime),
        entry_point: literal(&function.entry_point),
        source: FunctionSource {
            storage_source: StorageSource {
                bucket: bucket.attr("name").into(),
                object: object.attr("name").into(),
            },
        },
    }
}

/// Build the whole deployment graph for `config`, leaves first.
pub fn build_stack(config: &StackConfig) -> Result<Stack, StackError> {
    let mut builder = StackBuilder::new(config);

    builder.bind_provider()?;
    builder.declare_build_trigger()?;
    let bucket = builder.declare_storage()?;
    let objects = builder.upload_function_sources(&bucket)?;
    let topics = builder.declare_messaging()?;
    let secrets = builder.declare_secrets()?;
    let warehouse = builder.declare_warehouse()?;
    let identities = builder.declare_identities()?;
    let grants = builder.declare_grants(&identities, &topics, &secrets, &warehouse)?;
    let functions = builder.declare_functions(
        &bucket,
        &objects,
        &topics,
        &secrets,
        &warehouse,
        &identities,
        &grants,
    )?;
    builder.declare_schedule(&functions, &identities)?;
    builder.declare_subscription(&topics, &warehouse)?;

    let stack = builder.finish()?;
    info!(
        "built stack {} with {} nodes ({} sink)",
        stack.name,
        stack.graph.len(),
        config.warehouse.sink
    );
    Ok(stack)
}
