#[cfg(test)]
mod api_tests {
    use actix_web::{test, web, App};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Arc;

    use obra_report_server::dispatch::{DownloadSink, NoShareTarget};
    use obra_report_server::form::handlers;
    use obra_report_server::status::messages;
    use obra_report_server::{AppConfig, AppState};

    const BOUNDARY: &str = "----obra-test-boundary";

    fn test_state() -> AppState {
        AppState::with_components(
            AppConfig::default(),
            reqwest::Client::new(),
            Arc::new(NoShareTarget),
            Arc::new(DownloadSink),
        )
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn filled() -> Value {
        json!({
            "bairro": "São José",
            "rua": "rua do sol",
            "complemento": "Quadra 2",
            "descricao": "Drenagem concluída"
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .service(web::scope("/api").configure(handlers::config)),
            )
            .await
        };
    }

    macro_rules! open_form {
        ($app:expr) => {{
            let req = test::TestRequest::post().uri("/api/forms").to_request();
            let resp = test::call_service(&$app, req).await;
            assert_eq!(resp.status(), 201);
            let body: Value = test::read_body_json(resp).await;
            body["id"].as_str().unwrap().to_string()
        }};
    }

    macro_rules! upload {
        ($app:expr, $id:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri(&format!("/api/forms/{}/image", $id))
                .insert_header((
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                ))
                .set_payload($body)
                .to_request();
            test::call_service(&$app, req).await
        }};
    }

    #[actix_web::test]
    async fn test_new_form_is_empty() {
        let app = app!(test_state());
        let id = open_form!(app);

        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["fields"]["neighborhood"], "");
        assert_eq!(body["preview"]["visible"], false);
        assert_eq!(body["submit_enabled"], true);
        assert!(body["registered_at"].as_str().unwrap().contains(", "));
    }

    #[actix_web::test]
    async fn test_unknown_session_is_404() {
        let app = app!(test_state());
        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", uuid::Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_submit_with_missing_fields_is_rejected() {
        let app = app!(test_state());
        let id = open_form!(app);

        let req = test::TestRequest::put()
            .uri(&format!("/api/forms/{}/fields", id))
            .set_json(json!({ "bairro": "Centro", "rua": "Rua A" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/submit", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], messages::REQUIRED_FIELDS);
        let fields: Vec<&str> = body["invalid_fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["complement", "description"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["status"]["kind"], "error");
    }

    #[actix_web::test]
    async fn test_submit_returns_pdf_attachment() {
        let app = app!(test_state());
        let id = open_form!(app);

        let req = test::TestRequest::put()
            .uri(&format!("/api/forms/{}/fields", id))
            .set_json(filled())
            .to_request();
        test::call_service(&app, req).await;

        let resp = upload!(app, id, multipart("file", "obra.png", "image/png", &png(400, 300)));
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/submit", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/pdf");
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("Relatorio_Obras_Sao_Jose.pdf"));
        assert_eq!(resp.headers().get("x-report-outcome").unwrap(), "saved");

        let bytes = test::read_body(resp).await;
        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["status"]["message"], messages::SAVED);
        assert_eq!(view["status"]["kind"], "success");
    }

    #[actix_web::test]
    async fn test_share_without_target_falls_back_to_download() {
        let app = app!(test_state());
        let id = open_form!(app);

        let req = test::TestRequest::put()
            .uri(&format!("/api/forms/{}/fields", id))
            .set_json(filled())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/share", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("x-report-outcome").unwrap(), "saved-fallback");

        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["status"]["message"], messages::SHARE_FALLBACK);
    }

    #[actix_web::test]
    async fn test_non_image_upload_clears_control() {
        let state = test_state();
        let previews = state.previews.clone();
        let app = app!(state);
        let id = open_form!(app);

        let resp = upload!(app, id, multipart("file", "obra.png", "image/png", &png(10, 10)));
        assert_eq!(resp.status(), 200);

        let resp = upload!(
            app,
            id,
            multipart("file", "notas.pdf", "application/pdf", b"%PDF-1.4")
        );
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get()
            .uri(&format!("/api/forms/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["controls"]["file"], Value::Null);
        assert_eq!(view["status"]["message"], messages::INVALID_IMAGE);
        // Earlier image is still held.
        assert_eq!(view["preview"]["visible"], true);
        assert_eq!(previews.live_count(), 1);
    }

    #[actix_web::test]
    async fn test_replacing_image_revokes_old_preview() {
        let app = app!(test_state());
        let id = open_form!(app);

        let resp = upload!(app, id, multipart("file", "a.png", "image/png", &png(8, 8)));
        let first: Value = test::read_body_json(resp).await;
        let first_src = first["preview"]["src"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&first_src).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");

        let resp = upload!(app, id, multipart("camera", "b.png", "image/png", &png(8, 8)));
        let second: Value = test::read_body_json(resp).await;
        assert_eq!(second["controls"]["file"], Value::Null);
        assert_eq!(second["controls"]["camera"], "b.png");
        assert_ne!(second["preview"]["src"], first["preview"]["src"]);

        let req = test::TestRequest::get().uri(&first_src).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_svg_preview_is_served_inert() {
        let app = app!(test_state());
        let id = open_form!(app);

        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
        let resp = upload!(app, id, multipart("file", "x.svg", "image/svg+xml", svg));
        assert_eq!(resp.status(), 200);
        let view: Value = test::read_body_json(resp).await;
        let src = view["preview"]["src"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&src).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let headers = resp.headers();
        assert_eq!(headers.get("content-type").unwrap(), "image/svg+xml");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("content-security-policy").unwrap(), "sandbox");
    }

    #[actix_web::test]
    async fn test_reset_empties_form() {
        let state = test_state();
        let previews = state.previews.clone();
        let app = app!(state);
        let id = open_form!(app);

        let req = test::TestRequest::put()
            .uri(&format!("/api/forms/{}/fields", id))
            .set_json(filled())
            .to_request();
        test::call_service(&app, req).await;
        upload!(app, id, multipart("file", "a.png", "image/png", &png(8, 8)));

        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/reset", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(view["fields"]["description"], "");
        assert_eq!(view["preview"]["visible"], false);
        assert_eq!(view["status"]["message"], "");
        assert_eq!(previews.live_count(), 0);
    }

    #[actix_web::test]
    async fn test_upload_without_image_field_is_rejected() {
        let app = app!(test_state());
        let id = open_form!(app);

        let resp = upload!(app, id, multipart("metadata", "x.txt", "text/plain", b"hello"));
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_locate_with_denied_permission_clears_fields() {
        let app = app!(test_state());
        let id = open_form!(app);

        let req = test::TestRequest::put()
            .uri(&format!("/api/forms/{}/fields", id))
            .set_json(filled())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/locate", id))
            .set_json(json!({ "error": "User denied Geolocation" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["alert"], messages::LOCATION_FAILED);
        assert_eq!(body["form"]["fields"]["neighborhood"], "");
        assert_eq!(body["form"]["fields"]["street"], "");
        assert_eq!(body["form"]["fields"]["complement"], "Quadra 2");
    }

    #[actix_web::test]
    async fn test_reverse_rejects_out_of_range() {
        let app = app!(test_state());
        let req = test::TestRequest::get()
            .uri("/api/address/reverse?lat=123.0&lon=0.0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
