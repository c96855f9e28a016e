/// Smoke-test for `ChromiumLauncher`.
///
/// Launches a headless Chromium, runs the listing workflow against a URL
/// given on the command line, and prints what came back.
///
/// Run with:
///   cargo run -p inkproxy-client --example session_smoke -- <url> [manga|chapters|images]
use inkproxy_client::{ChromiumLauncher, LaunchOptions};
use inkproxy_core::{FetchRequest, NullSnapshots, SiteProfile, Workflow, WorkflowConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut args = std::env::args().skip(1);
    let url = args.next();
    let mode = args.next();
    let request = FetchRequest::parse(url.as_deref(), mode.as_deref())?;

    let workflow = Workflow::new(
        ChromiumLauncher::new(LaunchOptions::default()),
        NullSnapshots,
        SiteProfile::default(),
        WorkflowConfig::default(),
    );

    println!("Fetching {} ({}) …", request.target_url, request.mode);
    let extraction = workflow.run(&request).await?;

    println!("{}", serde_json::to_string_pretty(&extraction.result)?);
    if extraction.truncated {
        println!("(load-more cap reached; list is partial)");
    }
    Ok(())
}
