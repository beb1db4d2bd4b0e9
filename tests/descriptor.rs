// ABOUTME: Integration tests for deployment descriptor parsing and scaffolding.
// ABOUTME: Tests YAML parsing, discovery order, and init behavior.

use caravel::descriptor::*;
use caravel::strategy::TimeUnit;
use std::fs;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_descriptor() {
        let yaml = r#"
environment:
  provider: kubernetes
  account: my-cluster
"#;
        let descriptor = DeploymentDescriptor::from_yaml(yaml).unwrap();
        assert!(descriptor.application.is_none());
        assert_eq!(descriptor.environment.provider, "kubernetes");
        assert_eq!(descriptor.environment.account, "my-cluster");
        assert!(descriptor.environment.namespace.is_none());
        assert!(descriptor.targets.is_empty());
        assert!(descriptor.manifests.is_empty());
        assert!(descriptor.strategies.is_empty());
    }

    #[test]
    fn parse_full_descriptor() {
        let yaml = r#"
version: v1
application: storefront

environment:
  provider: kubernetes
  account: prod-cluster
  namespace: web

targets:
  production:
    strategy: rolling
    constraints:
      dependsOn: [staging]
      beforeDeployment:
        - pause:
            untilApproved: true
        - pause:
            duration: 10
            unit: seconds
  staging:
    strategy: quick

strategies:
  rolling:
    kind: canary
    steps:
      - ratio{25}
      - pause
      - ratio{100}
  quick:
    kind: update
  swap:
    kind: bluegreen
    activeService: storefront-svc
    previewService: storefront-preview

manifests:
  - path: k8s/
  - path: extras/app.yaml
    targets: [production]
  - url: https://configs.example.com/base.yaml
  - kustomize: overlays/prod

wait:
  timeout: 15m
  interval: 2s
"#;
        let descriptor = DeploymentDescriptor::from_yaml(yaml).unwrap();
        assert_eq!(descriptor.application.as_deref(), Some("storefront"));
        assert_eq!(descriptor.environment.namespace.as_deref(), Some("web"));
        assert_eq!(descriptor.targets.len(), 2);
        assert_eq!(descriptor.strategies.len(), 3);
        assert_eq!(descriptor.manifests.len(), 4);
        assert_eq!(descriptor.wait.timeout, Duration::from_secs(900));
        assert_eq!(descriptor.wait.interval, Duration::from_secs(2));

        let production = &descriptor.targets["production"];
        assert_eq!(production.strategy, "rolling");
        let constraints = production.constraints.as_ref().unwrap();
        assert_eq!(constraints.depends_on, vec!["staging".to_string()]);
        assert_eq!(constraints.before_deployment.len(), 2);
        let BeforeStep::Pause(first) = &constraints.before_deployment[0];
        assert_eq!(first.until_approved, Some(true));
        let BeforeStep::Pause(second) = &constraints.before_deployment[1];
        assert_eq!(second.duration, Some(10));
        assert_eq!(second.unit, Some(TimeUnit::Seconds));

        let swap = &descriptor.strategies["swap"];
        assert_eq!(swap.kind, "bluegreen");
        assert_eq!(swap.active_service.as_deref(), Some("storefront-svc"));
        assert_eq!(swap.preview_service.as_deref(), Some("storefront-preview"));
    }

    #[test]
    fn manifest_source_variants_parse() {
        let yaml = r#"
environment:
  provider: kubernetes
  account: c
manifests:
  - path: k8s/
  - url: https://example.com/app.yaml
  - kustomize: overlays/prod
"#;
        let descriptor = DeploymentDescriptor::from_yaml(yaml).unwrap();
        assert!(matches!(
            descriptor.manifests[0].source,
            ManifestSource::Path(_)
        ));
        assert!(matches!(
            descriptor.manifests[1].source,
            ManifestSource::Url(_)
        ));
        assert_eq!(
            descriptor.manifests[2].source,
            ManifestSource::Kustomize("overlays/prod".to_string())
        );
    }

    #[test]
    fn missing_environment_returns_error() {
        let yaml = "application: storefront\n";
        let err = DeploymentDescriptor::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("environment"));
    }

    #[test]
    fn missing_account_returns_error() {
        let yaml = r#"
environment:
  provider: kubernetes
"#;
        let err = DeploymentDescriptor::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("account"));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discover_finds_primary_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DESCRIPTOR_FILENAME),
            "environment:\n  provider: kubernetes\n  account: a\n",
        )
        .unwrap();

        let descriptor = DeploymentDescriptor::discover(dir.path()).unwrap();
        assert_eq!(descriptor.environment.account, "a");
    }

    #[test]
    fn discover_falls_back_to_alternate_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DESCRIPTOR_FILENAME_ALT),
            "environment:\n  provider: kubernetes\n  account: alt\n",
        )
        .unwrap();

        let descriptor = DeploymentDescriptor::discover(dir.path()).unwrap();
        assert_eq!(descriptor.environment.account, "alt");
    }

    #[test]
    fn discover_without_descriptor_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeploymentDescriptor::discover(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

mod init {
    use super::*;

    #[test]
    fn init_writes_a_parseable_starter() {
        let dir = tempfile::tempdir().unwrap();
        init_descriptor(dir.path(), Some("storefront"), false).unwrap();

        let descriptor = DeploymentDescriptor::discover(dir.path()).unwrap();
        assert_eq!(descriptor.application.as_deref(), Some("storefront"));
        assert!(!descriptor.strategies.is_empty());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DESCRIPTOR_FILENAME), "existing: file").unwrap();

        let err = init_descriptor(dir.path(), None, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DESCRIPTOR_FILENAME), "existing: file").unwrap();

        init_descriptor(dir.path(), Some("fresh"), true).unwrap();
        let descriptor = DeploymentDescriptor::discover(dir.path()).unwrap();
        assert_eq!(descriptor.application.as_deref(), Some("fresh"));
    }
}
