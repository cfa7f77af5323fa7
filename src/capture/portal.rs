//! xdg-desktop-portal Screenshot integration, used when `slurp`/`grim` are
//! not installed.

use super::types::CaptureError;
use futures::StreamExt;
use std::collections::HashMap;
use zbus::zvariant::OwnedValue;
use zbus::{Connection, proxy};

/// D-Bus proxy for the xdg-desktop-portal Screenshot interface.
#[proxy(
    interface = "org.freedesktop.portal.Screenshot",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
trait Screenshot {
    /// Take a screenshot. Returns the path of a Request object whose
    /// `Response` signal carries the result.
    async fn screenshot(
        &self,
        parent_window: &str,
        options: HashMap<String, zbus::zvariant::Value<'_>>,
    ) -> zbus::Result<zbus::zvariant::OwnedObjectPath>;
}

/// D-Bus proxy for org.freedesktop.portal.Request interface.
#[proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop"
)]
trait Request {
    /// `response`: 0 = success, 1 = cancelled, 2 = other error.
    #[zbus(signal)]
    fn response(&self, response: u32, results: HashMap<String, OwnedValue>) -> zbus::Result<()>;
}

/// Run an interactive portal screenshot and return the URI of the file the
/// portal wrote.
pub async fn capture_via_portal() -> Result<String, CaptureError> {
    let connection = Connection::session().await?;
    let proxy = ScreenshotProxy::new(&connection).await?;

    let options = build_portal_options();
    log::debug!("Calling portal screenshot with options: {:?}", options);

    let request_path = proxy.screenshot("", options).await.map_err(|e| {
        log::error!("Portal screenshot call failed: {}", e);
        if e.to_string().contains("denied") {
            CaptureError::PermissionDenied
        } else {
            CaptureError::DBusError(e)
        }
    })?;

    log::info!("Screenshot request created: {:?}", request_path);

    let request_proxy = RequestProxy::builder(&connection)
        .path(request_path.clone())?
        .build()
        .await?;

    let mut response_stream = request_proxy.receive_response().await?;

    log::debug!("Waiting for Response signal...");

    let response_signal = response_stream
        .next()
        .await
        .ok_or_else(|| CaptureError::InvalidResponse("No Response signal received".to_string()))?;

    let args = response_signal.args().map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse response args: {}", e))
    })?;

    interpret_response(args.response, &args.results)
}

fn interpret_response(
    code: u32,
    results: &HashMap<String, OwnedValue>,
) -> Result<String, CaptureError> {
    match code {
        0 => {
            let uri_value = results.get("uri").ok_or_else(|| {
                CaptureError::InvalidResponse("No 'uri' field in response".to_string())
            })?;

            let uri_str: &str = uri_value.downcast_ref().map_err(|e| {
                CaptureError::InvalidResponse(format!("URI is not a string: {}", e))
            })?;

            log::info!("Portal screenshot captured: {}", uri_str);
            Ok(uri_str.to_string())
        }
        1 => Err(CaptureError::Cancelled(
            "Portal screenshot cancelled".to_string(),
        )),
        code => Err(CaptureError::InvalidResponse(format!(
            "Portal returned error code {}",
            code
        ))),
    }
}

/// Interactive, so the user picks the region in the portal's own UI.
fn build_portal_options() -> HashMap<String, zbus::zvariant::Value<'static>> {
    let mut options = HashMap::new();
    options.insert("modal".to_string(), true.into());
    options.insert("interactive".to_string(), true.into());
    options
}
