//! Integration tests for birclient

use birclient::{BirClient, BirError, SearchQuery, ServiceErrorKind, TEST_API_KEY, params};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests sent without a session header
struct NoSessionHeader;

impl Match for NoSessionHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("sid")
    }
}

/// Escape a data document the way the service embeds it in the Result element
fn escape(xml: &str) -> String {
    xml.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build a SOAP 1.2 response whose Result element holds `content`
fn envelope(action: &str, content: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing"><s:Header><a:Action s:mustUnderstand="1">http://CIS/BIR/PUBL/2014/07/IUslugaBIRzewnPubl/{action}Response</a:Action></s:Header><s:Body><{action}Response xmlns="http://CIS/BIR/PUBL/2014/07"><{action}Result>{content}</{action}Result></{action}Response></s:Body></s:Envelope>"#
    )
}

fn data_envelope(action: &str, dane: &str) -> String {
    envelope(action, &escape(&format!("<root>{dane}</root>")))
}

async fn mount_login(server: &MockServer, sid: &str) {
    Mock::given(method("POST"))
        .and(path("/bir"))
        .and(body_string_contains("pKluczUzytkownika"))
        .and(NoSessionHeader)
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope("Zaloguj", sid)))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> BirClient {
    BirClient::builder()
        .endpoint(format!("{}/bir", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bir"))
        .and(header("content-type", "application/soap+xml"))
        .and(body_string_contains(TEST_API_KEY))
        .and(NoSessionHeader)
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://CIS/BIR/PUBL/2014/07"><s:Body><a:ZalogujResponse><a:ZalogujResult>SESSION123</a:ZalogujResult></a:ZalogujResponse></s:Body></s:Envelope>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert!(!client.is_production());
    assert!(!client.is_authenticated());

    let sid = client.login().await.unwrap();

    assert_eq!(sid, "SESSION123");
    assert_eq!(client.session_id().as_deref(), Some("SESSION123"));
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_login_trims_session_id() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "\n  SESSION123  \n").await;

    let client = client_for(&mock_server);
    assert_eq!(client.login().await.unwrap(), "SESSION123");
}

#[tokio::test]
async fn test_login_empty_result_is_authentication_error() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "").await;

    let client = client_for(&mock_server);
    let err = client.login().await.unwrap_err();

    assert!(matches!(err, BirError::Authentication(_)));
    assert!(client.session_id().is_none());
}

#[tokio::test]
async fn test_login_without_key_is_configuration_error() {
    let mock_server = MockServer::start().await;

    // Aucune requête ne doit partir
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = BirClient::builder()
        .test_key("")
        .endpoint(format!("{}/bir", mock_server.uri()))
        .build()
        .unwrap();

    let err = client.login().await.unwrap_err();
    assert!(matches!(err, BirError::Configuration(_)));
}

#[tokio::test]
async fn test_report_normalizes_fields() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    Mock::given(method("POST"))
        .and(path("/bir"))
        .and(header("sid", "SESSION123"))
        .and(body_string_contains("DanePobierzPelnyRaport"))
        .and(body_string_contains("PublDaneRaportPrawna"))
        .and(body_string_contains("123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DanePobierzPelnyRaport",
            "<dane><prawNazwa>ACME</prawNazwa><prawRegon>123456789</prawRegon></dane>",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.login().await.unwrap();

    let report = client.report("123456789").await.unwrap();
    assert_eq!(report, json!({"nazwa": "ACME", "regon": "123456789"}));
}

#[tokio::test]
async fn test_search_not_found_is_service_error() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    Mock::given(method("POST"))
        .and(path("/bir"))
        .and(header("sid", "SESSION123"))
        .and(body_string_contains("DaneSzukajPodmioty"))
        .and(body_string_contains("<dat:Nip>0000000000</dat:Nip>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DaneSzukajPodmioty",
            "<dane><ErrorCode>4</ErrorCode>\
             <ErrorMessagePl>Nie znaleziono podmiotów.</ErrorMessagePl>\
             <ErrorMessageEn>No data found for the specified search criteria.</ErrorMessageEn>\
             <Nip>0000000000</Nip></dane>",
        )))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.login().await.unwrap();

    let err = client
        .search(&SearchQuery::nip("0000000000"))
        .await
        .unwrap_err();

    let service = err.as_service_error().expect("service error");
    assert_eq!(service.code, "4");
    assert_eq!(service.message, "Nie znaleziono podmiotów.");
    assert_eq!(service.kind(), ServiceErrorKind::NotFound);
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_search_single_and_multiple_results() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    Mock::given(method("POST"))
        .and(body_string_contains("<dat:Regon>000331501</dat:Regon>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DaneSzukajPodmioty",
            "<dane><Regon>000331501</Regon><Nip>5261040828</Nip>\
             <Nazwa>GŁÓWNY URZĄD STATYSTYCZNY</Nazwa><SilosID>6</SilosID></dane>",
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<dat:Krs>0000028860</dat:Krs>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DaneSzukajPodmioty",
            "<dane><Regon>1</Regon><Nazwa>A</Nazwa></dane>\
             <dane><Regon>2</Regon><Nazwa>B</Nazwa></dane>",
        )))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.login().await.unwrap();

    let one = client.search(&SearchQuery::regon("000331501")).await.unwrap();
    assert_eq!(
        one,
        json!({
            "regon": "000331501",
            "nip": "5261040828",
            "nazwa": "GŁÓWNY URZĄD STATYSTYCZNY",
            "silosId": "6"
        })
    );

    let many = client.search(&SearchQuery::krs("0000028860")).await.unwrap();
    assert_eq!(
        many,
        json!([{"regon": "1", "nazwa": "A"}, {"regon": "2", "nazwa": "B"}])
    );
}

#[tokio::test]
async fn test_search_without_session_omits_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("DaneSzukajPodmioty"))
        .and(NoSessionHeader)
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DaneSzukajPodmioty",
            "<dane><ErrorCode>7</ErrorCode>\
             <ErrorMessagePl>Brak sesji.</ErrorMessagePl></dane>",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .search(&SearchQuery::nip("5261040828"))
        .await
        .unwrap_err();

    assert!(err.is_session_error());
}

#[tokio::test]
async fn test_value_returns_raw_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns:pNazwaParametru>StatusUslugi</ns:pNazwaParametru>"))
        .and(NoSessionHeader)
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope("GetValue", "1")))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.value(params::SERVICE_STATUS).await.unwrap(), "1");
}

#[tokio::test]
async fn test_mtom_response() {
    let mock_server = MockServer::start().await;

    let body = format!(
        "\r\n--uuid:7c1f0e2a+id=1\r\n\
         Content-ID: <http://tempuri.org/0>\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         Content-Type: application/xop+xml;charset=utf-8;type=\"application/soap+xml\"\r\n\r\n\
         {}\r\n--uuid:7c1f0e2a+id=1--\r\n",
        envelope("GetValue", "2014-11-07")
    );

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.value(params::DATA_STATE).await.unwrap(), "2014-11-07");
}

#[tokio::test]
async fn test_missing_result_is_protocol_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><Other>x</Other></s:Body></s:Envelope>"#,
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.value(params::SESSION_STATUS).await.unwrap_err();
    assert!(matches!(err, BirError::Protocol(_)));
}

#[tokio::test]
async fn test_http_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.value(params::SERVICE_STATUS).await.unwrap_err();

    match err {
        BirError::Status { code, ref body } => {
            assert_eq!(code, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_http_status_with_truncated_body() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Content-Length annonce plus d'octets que le serveur n'en envoie
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\nshort")
            .await;
        let _ = socket.shutdown().await;
    });

    let client = BirClient::builder()
        .endpoint(format!("http://{addr}/bir"))
        .build()
        .unwrap();

    match client.value(params::SERVICE_STATUS).await.unwrap_err() {
        BirError::Status { code, body } => {
            assert_eq!(code, 503);
            assert!(body.starts_with("<unreadable body"), "body: {body}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(envelope("GetValue", "1"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = BirClient::builder()
        .endpoint(format!("{}/bir", mock_server.uri()))
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = client.value(params::SERVICE_STATUS).await.unwrap_err();
    assert!(matches!(err, BirError::Timeout(d) if d == Duration::from_millis(50)));
}

#[tokio::test]
async fn test_logout() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns:pIdentyfikatorSesji>SESSION123</ns:pIdentyfikatorSesji>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope("Wyloguj", "true")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.login().await.unwrap();

    assert!(client.logout().await.unwrap());
    assert!(!client.is_authenticated());

    // Plus de session : aucune requête
    assert!(!client.logout().await.unwrap());
}

#[tokio::test]
async fn test_failed_logout_keeps_session() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    // Premier Wyloguj en échec, le suivant aboutit
    Mock::given(method("POST"))
        .and(body_string_contains("pIdentyfikatorSesji"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns:pIdentyfikatorSesji>SESSION123</ns:pIdentyfikatorSesji>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope("Wyloguj", "true")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.login().await.unwrap();

    let err = client.logout().await.unwrap_err();
    assert!(matches!(err, BirError::Status { code: 500, .. }));
    assert_eq!(client.session_id().as_deref(), Some("SESSION123"));

    assert!(client.logout().await.unwrap());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_client_shared_between_tasks() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "SESSION123").await;

    Mock::given(method("POST"))
        .and(header("sid", "SESSION123"))
        .and(body_string_contains("DaneSzukajPodmioty"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_envelope(
            "DaneSzukajPodmioty",
            "<dane><Regon>1</Regon><Nazwa>A</Nazwa></dane>",
        )))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = Arc::new(client_for(&mock_server));
    client.login().await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.search(&SearchQuery::regon(i.to_string())).await })
        })
        .collect();

    for handle in handles {
        let found = handle.await.unwrap().unwrap();
        assert_eq!(found["nazwa"], "A");
    }
}
