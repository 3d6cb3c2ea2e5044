use model_store::{Client, MockTransport, MockUiBindings, ModelForm, ModelPayload, ScalarValue};

fn main() {
    let form = ModelForm::new(
        Client::with_transport(MockTransport::new()),
        "http://localhost:8000",
    );
    assert_eq!(form.endpoint(), "http://localhost:8000/model1");

    let payload = ModelPayload {
        name: "m".to_string(),
        value: ScalarValue::from(7i64),
    };
    assert_eq!(payload.value, ScalarValue::Int(7));

    let ui = MockUiBindings::new();
    assert!(!ui.error_flag());
    assert!(ui.display().is_none());
}
