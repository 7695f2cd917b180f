use http::{Method, Request, Response, StatusCode};
use hyper::service::service_fn;
use hyper_util::{rt::TokioIo, server::conn::auto};
use std::{convert::Infallible, time::Duration};
use tokio::net::TcpListener;
use topic_notify::StatusHandle;
use tracing::{debug, error};

/// Start the health check listening task
pub fn start_health_task(listener: TcpListener, status: StatusHandle) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move {
        loop {
            let Ok((stream, remote_addr)) = listener
                .accept()
                .await
                .inspect_err(|err| error!("Error accepting connection: {err}"))
            else {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            };
            debug!("New health connection from: {remote_addr}");

            let thread_status = status.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                // Serve the connection using auto protocol detection (HTTP/1 or HTTP/2)
                if let Err(err) = auto::Builder::new(hyper_util::rt::TokioExecutor::new())
                    .serve_connection(
                        io,
                        service_fn(|req| {
                            let resp = handle_health_request(&thread_status, &req);
                            async move { Ok::<_, Infallible>(resp) }
                        }),
                    )
                    .await
                {
                    error!("Error serving connection: {err}");
                }
            });
        }
    })
}

fn handle_health_request<B>(status: &StatusHandle, req: &Request<B>) -> Response<String> {
    debug!(
        "Received http request: {} {} (version: {:?})",
        req.method(),
        req.uri().path(),
        req.version()
    );

    fn err_resp(code: StatusCode, text: impl Into<String>) -> Response<String> {
        let mut resp = Response::new(text.into());
        *resp.status_mut() = code;
        resp
    }

    match req.uri().path() {
        "/" | "/health" => {
            if !matches!(req.method(), &Method::GET | &Method::HEAD) {
                err_resp(
                    StatusCode::NOT_IMPLEMENTED,
                    "Use GET or HEAD with this route",
                )
            } else if status.is_channel_joined() {
                Response::new("OK".into())
            } else {
                err_resp(StatusCode::SERVICE_UNAVAILABLE, "Not connected")
            }
        }
        _ => err_resp(StatusCode::NOT_FOUND, "Not found"),
    }
}
