use tempfile::TempDir;
use tokio::net::TcpListener;

use model_store::model::ModelRecord;
use model_store::store::ModelStore;
use model_store::{Client, HttpRequest, MockUiBindings, ModelForm, SubmitOutcome, api};

#[tokio::test]
async fn e2e_created_model_shows_up_in_the_listing() {
    let server = TestServer::start().await;
    let form = server.form();
    let ui = MockUiBindings::new();

    let outcome = form
        .create(&ui, "mymodel", 7i64)
        .await
        .expect("submission should succeed");

    assert_eq!(
        outcome,
        SubmitOutcome::Accepted {
            message: "Model created".to_string()
        }
    );
    assert_eq!(ui.display(), Some("Model created".to_string()));
    assert!(!ui.error_flag());

    let client = Client::new();
    let records: Vec<ModelRecord> = client
        .execute_json(HttpRequest::get(server.url("/model1/stored")))
        .await
        .expect("listing should parse");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "mymodel");
    assert_eq!(records[0].value, 7);
}

#[tokio::test]
async fn e2e_duplicate_create_raises_flag_and_notifies() {
    let server = TestServer::start().await;
    let form = server.form();
    let ui = MockUiBindings::new();

    form.create(&ui, "mymodel", 7i64)
        .await
        .expect("first submission should succeed");
    let outcome = form
        .create(&ui, "mymodel", 9i64)
        .await
        .expect("second submission should succeed");

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            detail: "This model already exists".to_string()
        }
    );
    assert_eq!(ui.display(), None);
    assert!(ui.error_flag());
    assert_eq!(ui.alerts(), vec!["This model already exists".to_string()]);
}

#[tokio::test]
async fn e2e_non_integer_value_alerts_with_validation_body() {
    let server = TestServer::start().await;
    let form = server.form();
    let ui = MockUiBindings::new();

    let outcome = form
        .create(&ui, "mymodel", "not-a-number")
        .await
        .expect("submission should succeed");

    let body = match outcome {
        SubmitOutcome::Invalid { body } => body,
        other => panic!("expected a validation outcome, got {other:?}"),
    };
    assert!(body.contains("errors"));
    assert!(ui.error_flag());
    assert_eq!(ui.alerts(), vec![body]);
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
    _data_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let data_dir = tempfile::tempdir().expect("tempdir");
        let store = ModelStore::open(data_dir.path()).expect("open store");
        let app = api::router(store);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            task,
            _data_dir: data_dir,
        }
    }

    fn form(&self) -> ModelForm {
        ModelForm::new(Client::new(), self.base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
