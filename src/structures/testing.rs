//! In-process stand-in for the monitoring API.

use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use reqwest::Client;

use super::api::MonitorClient;

#[derive(Debug, Clone, Copy)]
pub struct Canned {
    pub path: &'static str,
    pub status: u16,
    pub body: &'static str,
    /// Requests whose query string lacks one of these get a 400.
    pub expect_query: &'static [&'static str],
}

impl Canned {
    pub const fn ok(path: &'static str, body: &'static str) -> Self {
        Self {
            path,
            status: 200,
            body,
            expect_query: &[],
        }
    }
}

pub async fn serve(routes: Vec<Canned>) -> MonitorClient {
    let server = HttpServer::new(move || {
        let mut app = App::new();
        for canned in routes.iter().copied() {
            app = app.route(
                canned.path,
                web::get().to(move |req: HttpRequest| async move {
                    let query = req.query_string().to_string();
                    if canned.expect_query.iter().any(|part| !query.contains(part)) {
                        return HttpResponse::BadRequest().body(query);
                    }
                    let status = StatusCode::from_u16(canned.status).unwrap();
                    HttpResponse::build(status)
                        .content_type("application/json")
                        .body(canned.body)
                }),
            );
        }
        app
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    MonitorClient::new(&format!("http://{addr}/"), Client::new())
}
