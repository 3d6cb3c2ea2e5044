use model_store::{CannedResponse, Client, HttpRequest, MockTransport};

fn main() {
    let transport = MockTransport::new();
    transport.stub_post(
        "http://localhost:8000/model1",
        CannedResponse::text(200, r#"{"message":"ok"}"#),
    );
    let _client = Client::with_transport(transport.clone());

    let request = HttpRequest::post("http://localhost:8000/model1")
        .with_header("Content-Type", "application/json; charset=UTF-8")
        .with_body(r#"{"name":"m","value":1}"#)
        .with_timeout(std::time::Duration::from_millis(250));
    assert_eq!(request.url(), "http://localhost:8000/model1");

    let snapshot = transport.snapshot();
    assert_eq!(snapshot.request_count, 0);
}
