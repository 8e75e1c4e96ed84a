//! Maps requests to store operations.
//!
//! Two plugins exist: `nosql` (key-value operations, key in the path,
//! value in the body) and `snapshot` (arena backup/restore, file path in
//! the body). Anything else is 501.

use crate::request::{Method, Request};
use crate::response::Response;
use arenakv_core::{snapshot, Store};
use parking_lot::Mutex;

/// Routes a request to the store and produces the response.
pub fn handle(store: &Mutex<Store>, request: &Request) -> Response {
    match request.plugin.as_str() {
        "nosql" => handle_nosql(store, request),
        "snapshot" => handle_snapshot(store, request),
        other => {
            tracing::debug!(plugin = other, "unknown plugin");
            Response::not_implemented()
        }
    }
}

fn handle_nosql(store: &Mutex<Store>, request: &Request) -> Response {
    let key = request.param.as_bytes();
    match request.method {
        Method::Head => {
            if store.lock().has(key) {
                Response::ok()
            } else {
                Response::not_found()
            }
        }
        Method::Get => match store.lock().get(key) {
            Some(value) => Response::ok_with(value),
            None => Response::not_found(),
        },
        // Set is an upsert, which makes replace (PUT) and set (POST)
        // the same operation.
        Method::Put | Method::Post => {
            if store.lock().set(key, &request.body) {
                Response::ok()
            } else {
                Response::internal_error()
            }
        }
        Method::Delete => {
            if store.lock().delete(key) {
                Response::ok()
            } else {
                Response::not_found()
            }
        }
    }
}

fn handle_snapshot(store: &Mutex<Store>, request: &Request) -> Response {
    if request.method != Method::Post {
        return Response::not_implemented();
    }
    let path = String::from_utf8_lossy(&request.body);
    let path = path.trim();
    if path.is_empty() {
        return Response::internal_error_with("missing snapshot path");
    }

    let result = match request.param.as_str() {
        "backup" => {
            tracing::info!(path, "saving snapshot");
            snapshot::save(&store.lock(), path)
        }
        "restore" => {
            tracing::info!(path, "restoring snapshot");
            snapshot::load(&mut store.lock(), path)
        }
        other => {
            tracing::debug!(operation = other, "unknown snapshot operation");
            return Response::not_implemented();
        }
    };

    match result {
        Ok(()) => Response::ok(),
        Err(error) => {
            tracing::warn!(path, %error, "snapshot operation failed");
            Response::internal_error_with(error.to_string())
        }
    }
}
