// ABOUTME: Deploy command implementation.
// ABOUTME: Compiles the descriptor into a request, submits it, and waits on the pipeline.

use caravel::api::{ApiClient, ConfigLocation, PIPELINE_REF_PREFIX, Submission};
use caravel::cancel::CancelToken;
use caravel::descriptor::DeploymentDescriptor;
use caravel::error::{Error, Result};
use caravel::manifest::ManifestResolver;
use caravel::output::Output;
use caravel::request::{Overrides, assemble};
use caravel::waiter::{PipelineWaiter, WaitOutcome, WaitSettings};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

pub struct DeployOptions {
    pub file: Option<PathBuf>,
    pub application: Option<String>,
    pub account: Option<String>,
    pub from_url: Option<String>,
    pub from_pipeline: Option<String>,
    pub local: bool,
    pub image_versions: Vec<String>,
    pub watch: bool,
    pub console_url: Option<String>,
}

pub async fn deploy(
    options: DeployOptions,
    client: &ApiClient,
    output: &mut Output,
    cancel: &mut CancelToken,
) -> Result<()> {
    output.start_timer();

    let overrides = Overrides {
        application: options.application.clone(),
        account: options.account.clone(),
    };

    // Reference submissions skip descriptor compilation entirely: the config
    // already lives on the backend side.
    if let Some(location) = reference_location(&options) {
        let submission = Submission::by_reference(location, &overrides)?;
        let settings = WaitSettings {
            console_base_url: options.console_url.clone(),
            ..WaitSettings::default()
        };
        return submit_and_wait(client, &submission, settings, options.watch, output, cancel)
            .await;
    }

    let descriptor = load_descriptor(options.file.as_deref())?;

    let versions = parse_image_versions(&options.image_versions)?;
    let resolver = ManifestResolver::new(options.local, versions);
    output.progress("Resolving manifests...");
    let artifacts = resolver.resolve(&descriptor.manifests).await?;

    let request = assemble(&descriptor, artifacts, &overrides)?;
    let submission = Submission::Structured(request);

    let settings = WaitSettings {
        interval: descriptor.wait.interval,
        timeout: descriptor.wait.timeout,
        console_base_url: options.console_url.clone(),
    };

    submit_and_wait(client, &submission, settings, options.watch, output, cancel).await
}

fn reference_location(options: &DeployOptions) -> Option<ConfigLocation> {
    if let Some(url) = &options.from_url {
        return Some(ConfigLocation::parse(url));
    }
    options.from_pipeline.as_ref().map(|raw| {
        // Accept both the prefixed form and a bare pipeline id.
        if raw.starts_with(PIPELINE_REF_PREFIX) {
            ConfigLocation::parse(raw)
        } else {
            ConfigLocation::parse(&format!("{PIPELINE_REF_PREFIX}{raw}"))
        }
    })
}

fn load_descriptor(file: Option<&std::path::Path>) -> Result<DeploymentDescriptor> {
    match file {
        Some(path) => DeploymentDescriptor::load(path),
        None => {
            let cwd = env::current_dir()?;
            DeploymentDescriptor::discover(&cwd)
        }
    }
}

fn parse_image_versions(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut versions = BTreeMap::new();
    for entry in raw {
        let Some((image, version)) = entry.split_once('=') else {
            return Err(Error::InvalidImageVersion(entry.clone()));
        };
        if image.is_empty() || version.is_empty() {
            return Err(Error::InvalidImageVersion(entry.clone()));
        }
        versions.insert(image.to_string(), version.to_string());
    }
    Ok(versions)
}

async fn submit_and_wait(
    client: &ApiClient,
    submission: &Submission,
    settings: WaitSettings,
    watch: bool,
    output: &mut Output,
    cancel: &mut CancelToken,
) -> Result<()> {
    output.progress("Submitting deployment...");
    let created = client.submit_pipeline(submission).await?;

    let waiter = PipelineWaiter::new(client, settings);
    output.pipeline_created(&created, waiter.console_url(&created.id).as_deref());

    let outcome = if watch {
        waiter.track(&created.id, cancel, output).await?
    } else {
        waiter.wait_until_started(&created.id, cancel).await?
    };

    match outcome {
        WaitOutcome::Started => {
            output.success("Pipeline started");
            Ok(())
        }
        WaitOutcome::Completed(status) if status.is_successful() => {
            output.success("Pipeline succeeded");
            Ok(())
        }
        WaitOutcome::Completed(status) => Err(Error::PipelineFailed(status)),
        WaitOutcome::Untracked => {
            output.progress("Status tracking is not available for this pipeline; nothing to wait on");
            Ok(())
        }
    }
}
