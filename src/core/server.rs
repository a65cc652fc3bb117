/// MCP HTTP Server
///
/// Routes and bootstrap for the Actix Web server:
/// - GET /      plain-text availability notice
/// - POST /mcp  MCP streamable HTTP endpoint (JSON or SSE responses)
/// - any other method on /mcp is answered with 405

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer, ResponseError, web,
    http::header::{self, ContentType},
    middleware::{Compress, DefaultHeaders, Logger},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::ServerConfig;
use crate::core::error::{HttpError, RegistryError};
use crate::core::protocol::{self, AppState, Envelope, MCPResponse};
use crate::core::registry::ToolRegistry;
use crate::core::transport::{self, Exchange, ExchangeBody};
use crate::tools;

/// Fixed body of the informational root route.
pub const AVAILABILITY_MESSAGE: &str = "MCP streamable HTTP server running at /mcp";

/// Build the registry with every built-in tool and freeze it.
///
/// Fails if two tools share a name.
pub fn initialize_tools() -> Result<Arc<ToolRegistry>, RegistryError> {
    let mut registry = ToolRegistry::new();
    tools::register_all(&mut registry)?;
    Ok(Arc::new(registry))
}

/// Register all routes. Shared by the real server and the HTTP tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index)).service(
        web::resource("/mcp")
            .route(web::post().to(mcp_post))
            .default_service(web::route().to(method_not_allowed)),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(AVAILABILITY_MESSAGE)
}

async fn method_not_allowed() -> Result<HttpResponse, HttpError> {
    Err(HttpError::MethodNotAllowed)
}

/// Handle one MCP POST.
///
/// A fresh exchange is opened per request and every message in the body is
/// dispatched through it. Notifications-only bodies get 202 with no content.
/// Clients that accept `text/event-stream` receive one SSE event per
/// response; everyone else gets plain JSON. Whatever the outcome, the
/// response body owns the exchange until actix has written it.
async fn mcp_post(state: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let mut exchange = Exchange::open();

    if !is_json_content_type(&req) {
        return reject(exchange, HttpError::UnsupportedMediaType);
    }

    let envelope = match Envelope::parse(&body) {
        Ok(envelope) => envelope,
        Err(e) => return reject(exchange, e),
    };
    let batch = envelope.is_batch();

    let responses: Vec<MCPResponse> = envelope
        .into_requests()
        .into_iter()
        .filter_map(|message| protocol::handle_request(&state, &mut exchange, message))
        .collect();

    if responses.is_empty() {
        return HttpResponse::Accepted().body(ExchangeBody::empty(exchange));
    }

    if accepts_event_stream(&req) {
        let events = match responses
            .iter()
            .map(transport::sse_event)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(events) => events,
            Err(e) => return reject(exchange, e.into()),
        };

        return HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
            // Keep Compress from buffering the stream
            .insert_header((header::CONTENT_ENCODING, "identity"))
            .body(ExchangeBody::events(exchange, events));
    }

    let json = match responses.as_slice() {
        [single] if !batch => serde_json::to_vec(single),
        all => serde_json::to_vec(all),
    };
    match json {
        Ok(json) => HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(ExchangeBody::full(exchange, json)),
        Err(e) => reject(exchange, e.into()),
    }
}

/// Answer with an error response that still owns the exchange.
///
/// # Arguments
/// * `exchange` - The exchange being rejected
/// * `error` - Decides the status code and the JSON-RPC error body
fn reject(mut exchange: Exchange, error: HttpError) -> HttpResponse {
    debug!(error = %error, "request rejected");
    exchange.reject();
    HttpResponse::build(error.status_code())
        .content_type(ContentType::json())
        .body(ExchangeBody::full(exchange, error.body().to_string()))
}

fn is_json_content_type(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn accepts_event_stream(req: &HttpRequest) -> bool {
    req.headers()
        .get_all(header::ACCEPT)
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|item| {
            item.split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/event-stream"))
        })
}

/// Run the MCP server in HTTP mode until shutdown.
pub async fn run_server_http(config: ServerConfig, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();

    let app_state = web::Data::new(AppState {
        server_name: config.name.clone(),
        server_version: config.version.clone(),
        registry,
    });

    info!(
        name = %config.name,
        version = %config.version,
        bind = %bind_addr,
        workers = config.workers,
        tools = app_state.registry.len(),
        "MCP server starting (streamable HTTP)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("Access-Control-Allow-Origin", "*")),
            )
            // %r = request line, %s = status, %D = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(config.workers)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}
