use clap::Args;
use minijinja::{context, Environment};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const STACK_FILE_NAME: &str = "stack.yml";
const STACK_TEMPLATE: &str = include_str!("templates/stack.yml.j2");

const DEFAULT_REGION: &str = "us-central1";
const DEFAULT_CITY: &str = "Tokyo";

const SAMPLE_WEATHER_GETTER_GO: &str = "package weathergetter\n\nimport (\n\t\"net/http\"\n\n\t\"github.com/GoogleCloudPlatform/functions-framework-go/functions\"\n)\n\nfunc init() {\n\tfunctions.HTTP(\"GetWeather\", GetWeather)\n}\n\n// GetWeather fetches the weather for each city in CITIES and publishes it\n// to TRANSFORMER_QUEUE.\nfunc GetWeather(w http.ResponseWriter, r *http.Request) {\n\tw.WriteHeader(http.StatusOK)\n}\n";
const SAMPLE_TRANSFORMER_GO: &str = "package transformer\n\nimport (\n\t\"context\"\n\n\t\"github.com/GoogleCloudPlatform/functions-framework-go/functions\"\n\t\"github.com/cloudevents/sdk-go/v2/event\"\n)\n\nfunc init() {\n\tfunctions.CloudEvent(\"Transform\", Transform)\n}\n\n// Transform reshapes one raw weather message into a warehouse row.\nfunc Transform(ctx context.Context, e event.Event) error {\n\treturn nil\n}\n";

/// A function source directory created by `init`.
#[derive(Serialize)]
struct FunctionTemplate {
    key: &'static str,
    dir: &'static str,
    entry_point: &'static str,
    #[serde(skip)]
    source_file: &'static str,
    #[serde(skip)]
    source: &'static str,
}

const FUNCTIONS: [FunctionTemplate; 2] = [
    FunctionTemplate {
        key: "weather_getter",
        dir: "weathergetter",
        entry_point: "GetWeather",
        source_file: "weathergetter.go",
        source: SAMPLE_WEATHER_GETTER_GO,
    },
    FunctionTemplate {
        key: "transformer",
        dir: "transformer",
        entry_point: "Transform",
        source_file: "transformer.go",
        source: SAMPLE_TRANSFORMER_GO,
    },
];

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(
        long = "dir",
        short = 'd',
        default_value = ".",
        help = "Target path for the stack"
    )]
    pub(crate) path: PathBuf,
    #[arg(
        long = "name",
        short = 'n',
        default_value = "weather-stack",
        help = "stack name"
    )]
    pub(crate) name: String,
    #[arg(long = "project", short = 'p', help = "cloud project id")]
    pub(crate) project: String,
    #[arg(long = "region", default_value = DEFAULT_REGION, help = "deployment region")]
    pub(crate) region: String,
}

fn render_stack_file<S: Serialize>(
    env: &mut Environment,
    stack_path: &Path,
    ctx: S,
) -> io::Result<()> {
    env.add_template(STACK_FILE_NAME, STACK_TEMPLATE)
        .map_err(io::Error::other)?;
    let template = env.get_template(STACK_FILE_NAME).map_err(io::Error::other)?;
    let rendered = template.render(ctx).map_err(io::Error::other)?;

    let write_path = stack_path.join(STACK_FILE_NAME);
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&write_path)?;
    file.write_all(rendered.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

fn write_file_if_missing(path: impl AsRef<Path>, contents: &str) -> io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(())
}

fn create_function_sources(stack_path: &Path) -> io::Result<()> {
    for function in &FUNCTIONS {
        let dir = stack_path.join(function.dir);
        fs::create_dir_all(&dir)?;
        write_file_if_missing(dir.join(function.source_file), function.source)?;
        write_file_if_missing(
            dir.join("go.mod"),
            &format!("module {}\n\ngo 1.21\n", function.dir),
        )?;
    }
    Ok(())
}

/// Scaffold `<path>/<name>` with a `stack.yml` and placeholder function
/// sources. Refuses to overwrite an existing `stack.yml`.
pub fn handle_init(path: &Path, name: &str, project: &str, region: &str) -> io::Result<()> {
    if !path.exists() {
        log::info!("creating {}", path.display());
        fs::create_dir_all(path)?;
    }

    let stack_path = path.join(name);
    if stack_path.join(STACK_FILE_NAME).exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already contains a {STACK_FILE_NAME}", stack_path.display()),
        ));
    }
    fs::create_dir_all(&stack_path)?;
    log::info!("initialising stack at {}", stack_path.display());

    let mut env = Environment::new();
    render_stack_file(
        &mut env,
        &stack_path,
        context! {
            stack_name => name,
            project => project,
            region => region,
            cities => vec![DEFAULT_CITY],
            functions => &FUNCTIONS,
        },
    )?;

    create_function_sources(&stack_path)?;
    Ok(())
}
