use log::info;
use rouille::{Request, Response};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::HttpConfig,
    http::error::ApiError,
    pipeline::collaborators::Renderer,
    preview::{self, RecordSource},
};

pub struct HttpServer {
    source: Arc<dyn RecordSource + Send + Sync>,
    renderer: Arc<dyn Renderer + Send + Sync>,
    pub config: HttpConfig,
}

#[derive(Deserialize)]
struct PreviewRequest {
    url: String,
    /// probing every file with ffprobe is slow, so it is opt-in
    #[serde(default)]
    durations: bool,
}

impl HttpServer {
    pub fn new(
        source: impl RecordSource + Send + Sync + 'static,
        renderer: impl Renderer + Send + Sync + 'static,
        config: HttpConfig,
    ) -> Self {
        Self {
            source: Arc::new(source),
            renderer: Arc::new(renderer),
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/health) => {
                Response::text("ok")
            },

            (POST) (/api/preview) => {
                self.handle_preview(request)
            },

            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn handle_preview(&self, request: &Request) -> Response {
        match self.preview(request) {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    fn preview(&self, request: &Request) -> Result<Response, ApiError> {
        let body: PreviewRequest = rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("expected {{\"url\": ...}}: {e}")))?;

        let loaded = preview::load(self.source.as_ref(), &body.url)?;
        let renderer = body
            .durations
            .then(|| self.renderer.as_ref() as &dyn Renderer);
        Ok(Response::json(&preview::build(&loaded, renderer)))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline::error::RenderError, preview::tests::FakeSource};

    use serde_json::Value;
    use std::{io::Read, path::Path};

    struct NoProbe;

    impl Renderer for NoProbe {
        fn render(&self, _: &Path, _: Option<&Path>, _: &Path) -> Result<(), RenderError> {
            unreachable!()
        }

        fn duration(&self, _: &str) -> Option<f64> {
            Some(60.0)
        }
    }

    fn create_server(source: FakeSource) -> HttpServer {
        HttpServer::new(
            source,
            NoProbe,
            HttpConfig {
                bind_addr: "127.0.0.1".to_string(),
                port: 8080,
            },
        )
    }

    fn post_preview(body: &str) -> Request {
        Request::fake_http(
            "POST",
            "/api/preview",
            vec![("Content-Type".to_string(), "application/json".to_string())],
            body.as_bytes().to_vec(),
        )
    }

    fn parse_text_response(response: Response) -> anyhow::Result<String> {
        let mut buf = String::new();
        response
            .data
            .into_reader_and_size()
            .0
            .read_to_string(&mut buf)?;
        Ok(buf)
    }

    #[test]
    fn test_health() -> anyhow::Result<()> {
        let request = Request::fake_http("GET", "/health", vec![], vec![]);
        let response = create_server(FakeSource::romp()).handle_request(&request);

        assert_eq!(response.status_code, 200);
        assert_eq!(parse_text_response(response)?, "ok");
        Ok(())
    }

    #[test]
    fn test_preview_returns_tracks() -> anyhow::Result<()> {
        let request = post_preview(r#"{"url": "https://archive.org/details/romp2007-11-21"}"#);
        let response = create_server(FakeSource::romp()).handle_request(&request);

        assert_eq!(response.status_code, 200);
        let json: Value = parse_json_response(response)?;
        assert_eq!(json["identifier"], "romp2007-11-21");
        assert_eq!(json["tracks"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["tracks"][1]["file"], "romp2007-11-21t02.flac");
        assert!(json["tracks"][0]["duration_secs"].is_null());
        Ok(())
    }

    #[test]
    fn test_preview_probes_durations_on_request() -> anyhow::Result<()> {
        let request = post_preview(r#"{"url": "romp2007-11-21", "durations": true}"#);
        let response = create_server(FakeSource::romp()).handle_request(&request);

        let json: Value = parse_json_response(response)?;
        assert_eq!(json["tracks"][0]["duration_secs"], 60.0);
        Ok(())
    }

    #[test]
    fn test_preview_bad_body() {
        let request = post_preview("not json");
        let response = create_server(FakeSource::romp()).handle_request(&request);
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_preview_foreign_url() {
        let request = post_preview(r#"{"url": "https://example.com/x"}"#);
        let response = create_server(FakeSource::romp()).handle_request(&request);
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_preview_unknown_collection() {
        let request = post_preview(r#"{"url": "missing"}"#);
        let response = create_server(FakeSource { record: None }).handle_request(&request);
        assert_eq!(response.status_code, 404);
    }

    #[test]
    fn test_preview_without_track_data() -> anyhow::Result<()> {
        let record = serde_json::from_value(serde_json::json!({
            "metadata": {"title": "Talk"},
            "files": [{"name": "notes.txt", "source": "original"}],
        }))?;
        let request = post_preview(r#"{"url": "talk"}"#);
        let response = create_server(FakeSource {
            record: Some(record),
        })
        .handle_request(&request);
        assert_eq!(response.status_code, 422);
        Ok(())
    }

    #[test]
    fn test_unknown_route() {
        let request = Request::fake_http("GET", "/tracks/1", vec![], vec![]);
        let response = create_server(FakeSource::romp()).handle_request(&request);
        assert_eq!(response.status_code, 404);
    }
}
