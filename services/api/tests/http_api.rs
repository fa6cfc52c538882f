use api_lib::{
    adapters::{InMemoryFormStore, SubmissionLog},
    config::Config,
    web::{build_router, AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use pretty_assertions::assert_eq;
use recruitment_forms_core::{
    instance::SUBMISSION_FAILED_MESSAGE, presets::candidate_profile_fields, AddressToken,
    FormDefinition, QuestionSpec,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    submissions: Arc<SubmissionLog>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_quota(None)
    }

    fn with_quota(max_per_form: Option<usize>) -> Self {
        let submissions = Arc::new(SubmissionLog::new(max_per_form));
        let state = Arc::new(AppState {
            forms: Arc::new(InMemoryFormStore::new()),
            submissions: submissions.clone(),
            applications: submissions.clone(),
            config: Arc::new(Config::default()),
        });
        Self {
            router: build_router(state),
            submissions,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Saves a valid draft with one required question and publishes it.
    async fn publish(&self, campaign_id: &str) -> String {
        let draft = json!({
            "title": "Responsable Comptable",
            "description": "Candidature pour le poste de Responsable Comptable",
            "questions": [
                { "question": "Pourquoi nous rejoindre ?", "required": true }
            ],
            "requireCV": true
        });
        let uri = format!("/campaigns/{}/form", campaign_id);
        let (status, _) = self.send(Method::PUT, &uri, Some(draft)).await;
        assert_eq!(status, StatusCode::OK);

        let uri = format!("/campaigns/{}/form/publish", campaign_id);
        let (status, body) = self.send(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

fn valid_application() -> Value {
    json!({
        "firstName": "Jean",
        "lastName": "Dupont",
        "email": "jean@x.fr",
        "phone": "0612345678",
        "question_0": "Pour relever de nouveaux défis",
        "cv": true
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_campaign_gets_the_default_draft() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/campaigns/7/form", None).await;

    assert_eq!(status, StatusCode::OK);
    let definition = &body["definition"];
    assert_eq!(definition["requireCV"], json!(true));
    assert_eq!(definition["requireCoverLetter"], json!(false));
    assert_eq!(definition["baseFields"].as_array().unwrap().len(), 4);
    assert_eq!(definition["questions"], json!([]));
}

#[tokio::test]
async fn publishing_an_incomplete_draft_reports_field_errors() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, "/campaigns/7/form/publish", None)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("title"));
    assert!(errors.contains_key("description"));
}

#[tokio::test]
async fn published_link_renders_fields_in_order() {
    let app = TestApp::new();
    let token = app.publish("1").await;
    assert!(AddressToken::parse(&token).is_ok());

    let (status, body) = app
        .send(Method::GET, &format!("/apply/{}", token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["key"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["firstName", "lastName", "email", "phone", "question_0", "cv"]
    );
    assert_eq!(body["fields"][4]["label"], json!("Pourquoi nous rejoindre ?"));
}

#[tokio::test]
async fn every_publication_gets_its_own_link() {
    let app = TestApp::new();
    let first = app.publish("1").await;
    let second = app.publish("1").await;
    assert_ne!(first, second);

    let (status, body) = app.send(Method::GET, "/campaigns/1/forms", None).await;
    assert_eq!(status, StatusCode::OK);
    let publications = body.as_array().unwrap();
    assert_eq!(publications.len(), 2);
    assert_eq!(
        publications[0]["formUrl"],
        json!(format!("http://localhost:3000/apply/{}", first))
    );

    // Older links keep resolving.
    let (status, _) = app
        .send(Method::GET, &format!("/apply/{}", first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn valid_application_is_recorded() {
    let app = TestApp::new();
    let token = app.publish("1").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/apply/{}", token),
            Some(valid_application()),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["formToken"], json!(token));
    assert_eq!(body["values"]["email"], json!("jean@x.fr"));
    assert_eq!(
        body["answers"],
        json!([{
            "questionIndex": 0,
            "question": "Pourquoi nous rejoindre ?",
            "answer": "Pour relever de nouveaux défis"
        }])
    );
    assert_eq!(body["attachments"], json!({ "cv": true, "coverLetter": false }));
    assert_eq!(app.submissions.records().len(), 1);
}

#[tokio::test]
async fn invalid_application_lists_failing_fields() {
    let app = TestApp::new();
    let token = app.publish("1").await;

    let mut application = valid_application();
    application["email"] = json!("jean@");
    application["question_0"] = json!("   ");

    let (status, body) = app
        .send(Method::POST, &format!("/apply/{}", token), Some(application))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"],
        json!({
            "email": "invalid email address",
            "question_0": "this field is required"
        })
    );
    assert!(app.submissions.records().is_empty());
}

#[tokio::test]
async fn unknown_field_is_a_bad_request() {
    let app = TestApp::new();
    let token = app.publish("1").await;

    let mut application = valid_application();
    application["question_5"] = json!("hors formulaire");

    let (status, body) = app
        .send(Method::POST, &format!("/apply/{}", token), Some(application))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("unknown field 'question_5'"));
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app.send(Method::GET, "/apply/not-a-token", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unpublished = AddressToken::generate();
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/apply/{}", unpublished),
            Some(valid_application()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn collaborator_rejection_is_a_bad_gateway() {
    let app = TestApp::with_quota(Some(0));
    let token = app.publish("1").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/apply/{}", token),
            Some(valid_application()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], json!(SUBMISSION_FAILED_MESSAGE));
}

#[tokio::test]
async fn removing_a_question_shifts_later_ones_up() {
    let app = TestApp::new();
    for text in ["Première question ?", "Deuxième question ?"] {
        let (status, _) = app
            .send(
                Method::POST,
                "/campaigns/3/form/questions",
                Some(json!({ "question": text, "required": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(Method::DELETE, "/campaigns/3/form/questions/0", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["definition"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["question"], json!("Deuxième question ?"));

    let (status, _) = app
        .send(Method::DELETE, "/campaigns/3/form/questions/4", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn questions_sharing_an_id_cannot_be_published() {
    let app = TestApp::new();
    let shared_id = "6f1c2a5e-8a3b-4c1d-9e2f-0a1b2c3d4e5f";
    let draft = json!({
        "title": "Responsable Comptable",
        "description": "Candidature pour le poste de Responsable Comptable",
        "questions": [
            { "id": shared_id, "question": "Pourquoi nous rejoindre ?", "required": true },
            { "id": shared_id, "question": "Autre chose à ajouter ?", "required": false }
        ]
    });
    let (status, _) = app
        .send(Method::PUT, "/campaigns/5/form", Some(draft))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::POST, "/campaigns/5/form/publish", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        json!(format!(
            "question id {} is used by more than one question",
            shared_id
        ))
    );

    let (_, body) = app.send(Method::GET, "/campaigns/5/forms", None).await;
    assert_eq!(body, json!([]));
}

fn profile_application(level: &str, born: NaiveDate, specialization: &str, years: u32) -> Value {
    json!({
        "firstName": "Awa",
        "lastName": "Ndiaye",
        "email": "awa@x.sn",
        "phone": "0612345678",
        "dateOfBirth": born.to_string(),
        "placeOfBirth": "Dakar",
        "educationLevel": level,
        "specialization": specialization,
        "yearsOfExperience": years,
        "question_0": "Pour relever de nouveaux défis",
        "cv": true
    })
}

#[tokio::test]
async fn received_applications_can_be_screened() {
    let app = TestApp::new();
    let today = Utc::now().date_naive();
    let definition = FormDefinition {
        title: "Contrôleur de gestion".to_string(),
        description: "Candidature pour le poste de contrôleur de gestion".to_string(),
        base_fields: candidate_profile_fields(today),
        questions: vec![QuestionSpec::new("Pourquoi nous rejoindre ?", true)],
        ..FormDefinition::default()
    };
    let (status, _) = app
        .send(
            Method::PUT,
            "/campaigns/9/form",
            Some(serde_json::to_value(&definition).unwrap()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .send(Method::POST, "/campaigns/9/form/publish", None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let token = body["token"].as_str().unwrap().to_string();

    // Born on January 1st, so the age is exact whatever today is.
    let thirty = NaiveDate::from_ymd_opt(today.year() - 30, 1, 1).unwrap();
    let fifty = NaiveDate::from_ymd_opt(today.year() - 50, 1, 1).unwrap();
    for application in [
        profile_application("bac+5", thirty, "Finance", 6),
        profile_application("bac+5", fifty, "Finance", 20),
        profile_application("bac+2", thirty, "Audit", 1),
    ] {
        let (status, body) = app
            .send(Method::POST, &format!("/apply/{}", token), Some(application))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = app
        .send(Method::GET, "/campaigns/9/applications", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(3));

    let (status, body) = app
        .send(
            Method::GET,
            "/campaigns/9/applications?educationLevel=bac%2B5&maxAge=40&specialization=finance&minYearsOfExperience=3",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(
        body["applications"][0]["values"]["dateOfBirth"],
        json!(thirty.to_string())
    );

    let (status, body) = app
        .send(Method::GET, "/campaigns/1/applications", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(0));

    let (status, _) = app
        .send(
            Method::GET,
            "/campaigns/9/applications?minAge=40&maxAge=30",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
