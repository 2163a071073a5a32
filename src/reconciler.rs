//! The reconcile loop run once per hook invocation.
//!
//! Every event re-derives the whole picture from scratch: is the workload
//! manageable, is there a complete upstream, what should squid.conf look
//! like, what should we advertise to the ingress controller. Nothing here
//! returns an error; collaborator failures end up in the log and in the
//! reported [`Status`].

use log::{debug, error, info, warn};

use crate::backend::{BackendError, ModelBackend};
use crate::config::Config;
use crate::event::{Endpoint, Entry, EventKind};
use crate::relation::RelationView;
use crate::render::render;
use crate::resolver::{
    build_render_context, resolve_cache_settings, resolve_ingress_spec, select_upstream,
    upstream_peers, UpstreamSource,
};
use crate::runtime::{WorkloadError, WorkloadRuntime};
use crate::state::{config_digest, ReconcileState};
use crate::types::{IngressSpec, Status};

pub const WORKLOAD_NOT_READY: &str = "Waiting for workload container";
pub const UPSTREAM_MISSING: &str = "Ingress proxy relation missing or incomplete";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForWorkload,
    WaitingForUpstream,
    Active,
}

pub struct Reconciler<B, W> {
    backend: B,
    workload: W,
    app_name: String,
    model_name: String,
    domain: String,
    log_format: Option<String>,
    config_path: String,
    state: ReconcileState,
    phase: Phase,
}

fn log_workload_error(op: &str, err: WorkloadError) {
    match err {
        WorkloadError::NotSupported(_) => error!("Could not {}: {}", op, err),
        other => error!("Failed to {}: {}", op, other),
    }
}

impl<B: ModelBackend, W: WorkloadRuntime> Reconciler<B, W> {
    pub fn new(backend: B, workload: W, config: &Config, state: ReconcileState) -> Self {
        Self {
            backend,
            workload,
            app_name: config.app_name.clone(),
            model_name: config.model_name.clone(),
            domain: config.domain.clone(),
            log_format: config.log_format.clone(),
            config_path: config.workload.config_path.clone(),
            state,
            phase: Phase::WaitingForWorkload,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub fn workload(&self) -> &W {
        &self.workload
    }

    /// Single entry point for the host's event loop.
    pub async fn handle_event(&mut self, event: &EventKind) -> Status {
        debug!("Handling {:?}", event);
        let status = match event.entry() {
            Entry::MarkWorkloadReady => {
                self.state.mark_workload_ready();
                self.evaluate(None, true).await
            }
            Entry::Reconcile => self.evaluate(event.departing(), true).await,
            Entry::Assess => self.evaluate(None, false).await,
        };
        if let Err(e) = self.backend.set_status(&status).await {
            error!("Failed to report status {}: {}", status, e);
        }
        status
    }

    async fn workload_ready(&self) -> bool {
        if !self.state.workload_ready {
            return false;
        }
        match self.workload.is_ready().await {
            Ok(ready) => ready,
            Err(e) => {
                warn!("Workload readiness check failed: {}", e);
                false
            }
        }
    }

    async fn fetch(&self, endpoint: Endpoint, departing: Option<Endpoint>) -> Option<RelationView> {
        if departing == Some(endpoint) {
            return None;
        }
        match self.backend.relation(endpoint).await {
            Ok(view) => view,
            Err(e) => {
                warn!("Could not read {} relation: {}", endpoint, e);
                None
            }
        }
    }

    async fn evaluate(&mut self, departing: Option<Endpoint>, apply: bool) -> Status {
        if !self.workload_ready().await {
            warn!("Workload not ready");
            self.phase = Phase::WaitingForWorkload;
            return Status::Blocked(WORKLOAD_NOT_READY.into());
        }

        let proxy = self.fetch(Endpoint::IngressProxy, departing).await;
        let cache = self.fetch(Endpoint::IngressCache, departing).await;
        let source = select_upstream(proxy, cache, &self.app_name);
        if source.is_none() {
            warn!("{}", UPSTREAM_MISSING);
            self.phase = Phase::WaitingForUpstream;
            return Status::Blocked(UPSTREAM_MISSING.into());
        }

        if apply {
            self.apply(&source).await;
        }
        self.phase = Phase::Active;
        info!("Charm ready");
        Status::Active
    }

    async fn apply(&mut self, source: &UpstreamSource) {
        let candidates: Vec<RelationView> = source.view().cloned().into_iter().collect();
        let spec = resolve_ingress_spec(&candidates, &self.app_name);
        let settings = resolve_cache_settings(source);
        let peers = upstream_peers(source, &self.model_name, &self.domain);
        let ctx = build_render_context(&spec, settings, peers, self.log_format.as_deref());
        let squid_config = render(&ctx);

        self.apply_config(&squid_config).await;
        self.advertise(&spec).await;
    }

    /// Push `squid_config` and restart squid if it differs from what the
    /// workload runs. Returns whether a new config was applied.
    async fn apply_config(&mut self, squid_config: &str) -> bool {
        if let Err(e) = self.workload.ensure_service().await {
            log_workload_error("ensure squid service", e);
        }

        let digest = config_digest(squid_config);
        let changed = match self.workload.pull_config(&self.config_path).await {
            Ok(Some(existing)) => existing != squid_config,
            Ok(None) => true,
            Err(e) => {
                log_workload_error(&format!("read {}", self.config_path), e);
                self.state.applied_digest.as_deref() != Some(digest.as_str())
            }
        };
        if !changed {
            debug!("squid.conf unchanged");
            self.state.applied_digest = Some(digest);
            return false;
        }

        info!("Pushing new squid.conf");
        debug!("{}", squid_config);
        let pushed = match self
            .workload
            .push_config(&self.config_path, squid_config)
            .await
        {
            Ok(()) => true,
            Err(e @ WorkloadError::NotSupported(_)) => {
                log_workload_error(&format!("push {}", self.config_path), e);
                true
            }
            Err(e) => {
                log_workload_error(&format!("push {}", self.config_path), e);
                false
            }
        };
        info!("Config change detected, restarting squid");
        if let Err(e) = self.workload.restart().await {
            log_workload_error("restart squid", e);
        }
        // A failed push must be retried on the next hook.
        self.state.applied_digest = pushed.then_some(digest);
        pushed
    }

    /// Publish `spec` on the ingress relation. Leader only.
    async fn advertise(&self, spec: &IngressSpec) {
        match self.backend.is_leader().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Not the leader, leaving ingress relation alone");
                return;
            }
            Err(e) => {
                warn!("Could not determine leadership: {}", e);
                return;
            }
        }

        let desired = spec.to_relation_data();
        match self.backend.local_app_data(Endpoint::Ingress).await {
            Ok(current) if current == desired => {
                debug!("Ingress relation already up to date");
                return;
            }
            Ok(_) => {}
            Err(BackendError::RelationNotFound(_)) => {
                debug!("No ingress relation yet");
                return;
            }
            Err(e) => warn!("Could not read ingress relation data: {}", e),
        }

        match self
            .backend
            .set_local_app_data(Endpoint::Ingress, &desired)
            .await
        {
            Ok(()) => info!(
                "Advertised ingress for {}:{}",
                spec.service_hostname, spec.service_port
            ),
            Err(BackendError::RelationNotFound(_)) => debug!("No ingress relation yet"),
            Err(e) => error!("Failed to update ingress relation: {}", e),
        }
    }
}

/// Report status for a hook whose workload runtime could not be reached.
///
/// A readiness mark carried by the event is still recorded in `state`.
pub async fn report_unreachable_workload<B: ModelBackend>(
    backend: &B,
    state: &mut ReconcileState,
    event: &EventKind,
) -> Status {
    if event.entry() == Entry::MarkWorkloadReady {
        state.mark_workload_ready();
    }
    let status = Status::Blocked(WORKLOAD_NOT_READY.into());
    if let Err(e) = backend.set_status(&status).await {
        error!("Failed to report status {}: {}", status, e);
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{SERVICE_HOSTNAME, SERVICE_NAME, SERVICE_PORT};
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const APP: &str = "squid-ingress-cache";

    #[derive(Default)]
    struct FakeBackend {
        leader: bool,
        relations: Mutex<HashMap<Endpoint, RelationView>>,
        local: Mutex<HashMap<Endpoint, BTreeMap<String, String>>>,
        statuses: Mutex<Vec<Status>>,
        writes: AtomicUsize,
    }

    impl FakeBackend {
        fn leader() -> Self {
            Self {
                leader: true,
                ..Default::default()
            }
        }

        fn relate(&self, endpoint: Endpoint, view: RelationView) {
            self.relations.lock().unwrap().insert(endpoint, view);
        }

        fn unrelate(&self, endpoint: Endpoint) {
            self.relations.lock().unwrap().remove(&endpoint);
        }

        fn with_ingress(self) -> Self {
            self.local
                .lock()
                .unwrap()
                .insert(Endpoint::Ingress, BTreeMap::new());
            self
        }

        fn ingress_data(&self) -> BTreeMap<String, String> {
            self.local.lock().unwrap()[&Endpoint::Ingress].clone()
        }
    }

    #[async_trait]
    impl ModelBackend for FakeBackend {
        async fn relation(
            &self,
            endpoint: Endpoint,
        ) -> Result<Option<RelationView>, BackendError> {
            Ok(self.relations.lock().unwrap().get(&endpoint).cloned())
        }

        async fn local_app_data(
            &self,
            endpoint: Endpoint,
        ) -> Result<BTreeMap<String, String>, BackendError> {
            self.local
                .lock()
                .unwrap()
                .get(&endpoint)
                .cloned()
                .ok_or(BackendError::RelationNotFound(endpoint))
        }

        async fn set_local_app_data(
            &self,
            endpoint: Endpoint,
            data: &BTreeMap<String, String>,
        ) -> Result<(), BackendError> {
            let mut local = self.local.lock().unwrap();
            let slot = local
                .get_mut(&endpoint)
                .ok_or(BackendError::RelationNotFound(endpoint))?;
            *slot = data.clone();
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn is_leader(&self) -> Result<bool, BackendError> {
            Ok(self.leader)
        }

        async fn set_status(&self, status: &Status) -> Result<(), BackendError> {
            self.statuses.lock().unwrap().push(status.clone());
            Ok(())
        }
    }

    struct FakeWorkload {
        ready: bool,
        files_supported: bool,
        file: Mutex<Option<String>>,
        failing_pushes: AtomicUsize,
        pushes: AtomicUsize,
        restarts: AtomicUsize,
    }

    impl FakeWorkload {
        fn new() -> Self {
            Self {
                ready: true,
                files_supported: true,
                file: Mutex::new(None),
                failing_pushes: AtomicUsize::new(0),
                pushes: AtomicUsize::new(0),
                restarts: AtomicUsize::new(0),
            }
        }

        fn pushes(&self) -> usize {
            self.pushes.load(Ordering::SeqCst)
        }

        fn restarts(&self) -> usize {
            self.restarts.load(Ordering::SeqCst)
        }

        fn config(&self) -> String {
            self.file.lock().unwrap().clone().unwrap_or_default()
        }
    }

    #[async_trait]
    impl WorkloadRuntime for FakeWorkload {
        async fn is_ready(&self) -> Result<bool, WorkloadError> {
            Ok(self.ready)
        }

        async fn ensure_service(&self) -> Result<(), WorkloadError> {
            Ok(())
        }

        async fn pull_config(&self, _path: &str) -> Result<Option<String>, WorkloadError> {
            if !self.files_supported {
                return Err(WorkloadError::NotSupported("pull"));
            }
            Ok(self.file.lock().unwrap().clone())
        }

        async fn push_config(&self, _path: &str, content: &str) -> Result<(), WorkloadError> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            let failing = self.failing_pushes.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_pushes.store(failing - 1, Ordering::SeqCst);
                return Err(WorkloadError::Archive(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "upload interrupted",
                )));
            }
            if !self.files_supported {
                return Err(WorkloadError::NotSupported("push"));
            }
            *self.file.lock().unwrap() = Some(content.to_string());
            Ok(())
        }

        async fn restart(&self) -> Result<(), WorkloadError> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn website() -> RelationView {
        RelationView::new("ingress-proxy", "mywebsite")
            .with_field(SERVICE_HOSTNAME, "mydomain.external.com")
            .with_field(SERVICE_NAME, "website")
            .with_field(SERVICE_PORT, "80")
            .with_field("limit-rps", "12")
            .with_unit("mywebsite/0")
    }

    fn config() -> Config {
        Config {
            app_name: APP.into(),
            model_name: "prod".into(),
            ..Config::default()
        }
    }

    fn reconciler(
        backend: FakeBackend,
        workload: FakeWorkload,
    ) -> Reconciler<FakeBackend, FakeWorkload> {
        Reconciler::new(backend, workload, &config(), ReconcileState::default())
    }

    #[tokio::test]
    async fn blocked_until_workload_ready() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());

        let status = r
            .handle_event(&EventKind::RelationChanged(Endpoint::IngressProxy))
            .await;
        assert_eq!(status, Status::Blocked(WORKLOAD_NOT_READY.into()));
        assert_eq!(r.phase(), Phase::WaitingForWorkload);
        assert_eq!(r.workload().pushes(), 0);
        assert_eq!(r.backend().statuses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_workload_is_not_ready() {
        let backend = FakeBackend::leader();
        backend.relate(Endpoint::IngressProxy, website());
        let mut workload = FakeWorkload::new();
        workload.ready = false;
        let mut r = reconciler(backend, workload);

        let status = r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Blocked(WORKLOAD_NOT_READY.into()));
        assert!(r.state().workload_ready);
    }

    #[tokio::test]
    async fn blocked_without_upstream() {
        let mut r = reconciler(FakeBackend::leader().with_ingress(), FakeWorkload::new());

        let status = r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Blocked(UPSTREAM_MISSING.into()));
        assert_eq!(r.phase(), Phase::WaitingForUpstream);
        assert_eq!(r.workload().pushes(), 0);
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incomplete_upstream_blocks() {
        let backend = FakeBackend::leader().with_ingress();
        let mut incomplete = website();
        incomplete.fields.remove(SERVICE_HOSTNAME);
        backend.relate(Endpoint::IngressProxy, incomplete);
        let mut r = reconciler(backend, FakeWorkload::new());

        let status = r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Blocked(UPSTREAM_MISSING.into()));
    }

    #[tokio::test]
    async fn applies_config_and_advertises_ingress() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());

        let status = r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Active);
        assert_eq!(r.phase(), Phase::Active);

        let squid_conf = r.workload().config();
        assert!(squid_conf.contains("\nhttp_port 80 accel\n"));
        assert!(squid_conf.contains(
            "cache_peer mywebsite-0.website-endpoints.prod.svc.cluster.local parent 80 0 no-query originserver\n"
        ));
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.workload().restarts(), 1);
        assert_eq!(
            r.state().applied_digest.as_deref(),
            Some(config_digest(&squid_conf).as_str())
        );

        let ingress = r.backend().ingress_data();
        assert_eq!(ingress["service-name"], APP);
        assert_eq!(ingress["service-hostname"], "mydomain.external.com");
        assert_eq!(ingress["service-port"], "80");
        assert_eq!(ingress["limit-rps"], "12");
        assert_eq!(
            r.backend().statuses.lock().unwrap().last(),
            Some(&Status::Active)
        );
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());

        r.handle_event(&EventKind::WorkloadReady).await;
        let first = r.workload().config();
        r.handle_event(&EventKind::RelationChanged(Endpoint::IngressProxy))
            .await;

        assert_eq!(r.workload().config(), first);
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.workload().restarts(), 1);
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ingress_only_change_updates_relation_without_restart() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());
        r.handle_event(&EventKind::WorkloadReady).await;

        r.backend()
            .relate(Endpoint::IngressProxy, website().with_field("limit-rps", "50"));
        r.handle_event(&EventKind::RelationChanged(Endpoint::IngressProxy))
            .await;

        assert_eq!(r.workload().restarts(), 1);
        assert_eq!(r.backend().ingress_data()["limit-rps"], "50");
    }

    #[tokio::test]
    async fn non_leader_configures_workload_only() {
        let backend = FakeBackend::default().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());

        let status = r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Active);
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 0);
        assert!(r.backend().ingress_data().is_empty());
    }

    #[tokio::test]
    async fn missing_ingress_relation_is_skipped() {
        let backend = FakeBackend::leader();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());

        assert_eq!(
            r.handle_event(&EventKind::WorkloadReady).await,
            Status::Active
        );
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn broken_relation_moves_back_to_waiting() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut r = reconciler(backend, FakeWorkload::new());
        assert_eq!(
            r.handle_event(&EventKind::WorkloadReady).await,
            Status::Active
        );

        // The departing relation is still listed while its broken hook runs.
        let status = r
            .handle_event(&EventKind::RelationBroken(Endpoint::IngressProxy))
            .await;
        assert_eq!(status, Status::Blocked(UPSTREAM_MISSING.into()));
        assert_eq!(r.phase(), Phase::WaitingForUpstream);

        r.backend().unrelate(Endpoint::IngressProxy);
        assert_eq!(
            r.handle_event(&EventKind::UpdateStatus).await,
            Status::Blocked(UPSTREAM_MISSING.into())
        );
    }

    #[tokio::test]
    async fn update_status_does_not_apply() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut state = ReconcileState::default();
        state.mark_workload_ready();
        let mut r = Reconciler::new(backend, FakeWorkload::new(), &config(), state);

        assert_eq!(r.handle_event(&EventKind::UpdateStatus).await, Status::Active);
        assert_eq!(r.workload().pushes(), 0);
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_relation_feeds_refresh_patterns() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(
            Endpoint::IngressCache,
            RelationView::new("ingress-cache", "shop")
                .with_field(SERVICE_HOSTNAME, "shop.example.com")
                .with_field(SERVICE_NAME, "shop")
                .with_field(SERVICE_PORT, "8080")
                .with_field(
                    "refresh-patterns",
                    r#"[{"regex": "^ftp:", "case_sensitive": false, "min": 1440,
                        "percent": 20, "max": 10080, "options": ["override-expire"]}]"#,
                )
                .with_unit("shop/0"),
        );
        let mut r = reconciler(backend, FakeWorkload::new());

        assert_eq!(
            r.handle_event(&EventKind::WorkloadReady).await,
            Status::Active
        );
        let squid_conf = r.workload().config();
        assert!(squid_conf.contains("refresh_pattern ^ftp: 1440 20% 10080 override-expire\n"));
        assert!(squid_conf.contains("http_port 8080 accel"));
        assert!(squid_conf.contains("cache_peer shop-0.shop-endpoints.prod.svc.cluster.local"));
        assert_eq!(r.backend().ingress_data()["service-name"], APP);
    }

    #[tokio::test]
    async fn proxy_wins_over_cache() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        backend.relate(
            Endpoint::IngressCache,
            RelationView::new("ingress-cache", "shop")
                .with_field(SERVICE_HOSTNAME, "shop.example.com")
                .with_field(SERVICE_NAME, "shop")
                .with_field(SERVICE_PORT, "8080"),
        );
        let mut r = reconciler(backend, FakeWorkload::new());
        r.handle_event(&EventKind::WorkloadReady).await;

        assert_eq!(
            r.backend().ingress_data()["service-hostname"],
            "mydomain.external.com"
        );
        assert!(r.workload().config().contains("http_port 80 accel"));
    }

    #[tokio::test]
    async fn unsupported_file_operations_fall_back_to_digest() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut workload = FakeWorkload::new();
        workload.files_supported = false;
        let mut r = reconciler(backend, workload);

        assert_eq!(
            r.handle_event(&EventKind::WorkloadReady).await,
            Status::Active
        );
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.workload().restarts(), 1);
        assert_eq!(r.backend().writes.load(Ordering::SeqCst), 1);

        r.handle_event(&EventKind::ConfigChanged).await;
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.workload().restarts(), 1);
    }

    #[tokio::test]
    async fn failed_push_is_retried_on_next_hook() {
        let backend = FakeBackend::leader().with_ingress();
        backend.relate(Endpoint::IngressProxy, website());
        let mut workload = FakeWorkload::new();
        workload.files_supported = false;
        workload.failing_pushes = AtomicUsize::new(1);
        let mut r = reconciler(backend, workload);

        r.handle_event(&EventKind::WorkloadReady).await;
        assert_eq!(r.workload().pushes(), 1);
        assert_eq!(r.state().applied_digest, None);

        r.handle_event(&EventKind::ConfigChanged).await;
        assert_eq!(r.workload().pushes(), 2);
        assert!(r.state().applied_digest.is_some());

        r.handle_event(&EventKind::ConfigChanged).await;
        assert_eq!(r.workload().pushes(), 2);
    }

    #[tokio::test]
    async fn unreachable_runtime_still_records_readiness() {
        let backend = FakeBackend::leader();
        let mut state = ReconcileState::default();

        let status =
            report_unreachable_workload(&backend, &mut state, &EventKind::WorkloadReady).await;
        assert_eq!(status, Status::Blocked(WORKLOAD_NOT_READY.into()));
        assert!(state.workload_ready);
        assert_eq!(
            backend.statuses.lock().unwrap().as_slice(),
            &[Status::Blocked(WORKLOAD_NOT_READY.into())]
        );

        let mut state = ReconcileState::default();
        report_unreachable_workload(&backend, &mut state, &EventKind::ConfigChanged).await;
        assert!(!state.workload_ready);
        assert_eq!(backend.statuses.lock().unwrap().len(), 2);
    }
}
