pub mod contracts;
pub mod templates;

mod admin;
mod multipart;

#[cfg(test)]
pub(crate) mod test_support {
    //! A fully wired `AppState` over a temporary directory, with an echoing
    //! renderer and a notifier that only counts.

    use crate::contracts::FsContractStore;
    use crate::db;
    use crate::notify::{Notification, Notifier, NotifyError};
    use crate::pdf::{Orientation, PageSize, PdfRenderer, RenderError};
    use crate::pipeline::{ContractPipeline, PipelineSettings};
    use crate::signature::{FsSignatureStore, SignatureRetention};
    use crate::state::AppState;
    use crate::templates::{SqliteTemplateStore, TemplateSelection, DEFAULT_TEMPLATE_HTML, DEFAULT_TEMPLATE_NAME};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct EchoRenderer;

    impl PdfRenderer for EchoRenderer {
        fn render(&self, html: &str, _: PageSize, _: Orientation) -> Result<Vec<u8>, RenderError> {
            Ok(format!("%PDF-echo\n{html}").into_bytes())
        }
    }

    #[derive(Default)]
    pub struct CountingNotifier {
        sent: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingNotifier {
        pub fn sent_count(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }

        pub fn fail_next(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            if self.fail.swap(false, Ordering::SeqCst) {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    pub struct TestApp {
        _dir: TempDir,
        pub state: AppState,
        pub notifier: Arc<CountingNotifier>,
    }

    pub fn app_state(admin_token: Option<&str>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.sqlite");
        db::init_schema(&db_path).unwrap();

        let templates = Arc::new(SqliteTemplateStore::new(&db_path));
        templates.seed(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE_HTML).unwrap();
        let selection = TemplateSelection::new(DEFAULT_TEMPLATE_NAME);
        let signatures = Arc::new(FsSignatureStore::new(dir.path().join("signatures")).unwrap());
        let contracts = Arc::new(FsContractStore::new(dir.path().join("contracts"), &db_path).unwrap());
        let notifier = Arc::new(CountingNotifier::default());

        let pipeline = ContractPipeline::new(
            templates.clone(),
            selection.clone(),
            signatures,
            contracts.clone(),
            Arc::new(EchoRenderer),
            notifier.clone(),
            PipelineSettings {
                admin_email: "admin@example.com".to_string(),
                signature_retention: SignatureRetention::Delete,
                page_size: PageSize::A4,
                orientation: Orientation::Portrait,
            },
        );

        TestApp {
            _dir: dir,
            state: AppState {
                pipeline: Arc::new(pipeline),
                templates,
                selection,
                contracts,
                admin_token: admin_token.map(str::to_string),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            notifier,
        }
    }
}
