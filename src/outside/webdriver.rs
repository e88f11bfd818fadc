use std::time::{Duration, Instant};

use miette::{miette, IntoDiagnostic};
use serde_json::{json, Value};
use tracing::debug;

use crate::result::{Error, Result};

/// W3C identifier key marking an element object in a WebDriver response
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How often an awaited selector is retried
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opaque reference to a located element.
/// Only meaningful within the session that produced it.
#[derive(Debug, Clone)]
pub struct ElementHandle(String);

#[cfg(test)]
impl ElementHandle {
    /// Placeholder handle for fake sessions
    pub fn dummy() -> Self {
        Self(String::new())
    }
}

/// The browser operations the link resolver needs.
/// [`WebDriver`] is the real implementation, tests substitute their own.
pub trait BrowserSession {
    /// Load the given page
    fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until an element matches the CSS selector, polling the page
    /// until the timeout runs out
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<ElementHandle>;

    /// Read an attribute of a previously located element
    fn read_attribute(&self, element: &ElementHandle, attribute: &str) -> Result<String>;
}

/// A headless Chrome session, speaking the W3C WebDriver protocol over HTTP
/// to a chromedriver instance
pub struct WebDriver {
    agent: ureq::Agent,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl WebDriver {
    /// Open a fresh headless browser session
    pub fn open(agent: ureq::Agent, base_url: &str) -> miette::Result<Self> {
        let body: Value = agent
            .post(&format!("{base_url}/session"))
            .send_json(new_session_payload())
            .map_err(|err| wire_error(err).wrap_err("Could not open a browser session"))?
            .into_json()
            .into_diagnostic()?;

        let session_id = session_id(&body)
            .ok_or_else(|| miette!("No session id in the WebDriver response"))?
            .to_owned();
        debug!("Browser session {session_id} opened");

        Ok(Self {
            agent,
            base_url: base_url.to_owned(),
            session_id,
            closed: false,
        })
    }

    /// End the session, closing the browser it drives
    pub fn close(mut self) -> miette::Result<()> {
        self.closed = true;
        self.agent
            .delete(&self.session_url())
            .call()
            .map_err(|err| wire_error(err).wrap_err("Could not close the browser session"))?;
        debug!("Browser session closed");
        Ok(())
    }

    fn session_url(&self) -> String {
        format!("{}/session/{}", self.base_url, self.session_id)
    }

    /// Single find attempt. `Ok(None)` when nothing matches yet.
    fn find_element(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let response = self
            .agent
            .post(&format!("{}/element", self.session_url()))
            .send_json(json!({ "using": "css selector", "value": selector }));

        let body: Value = match response {
            Ok(response) => response.into_json().into_diagnostic()?,
            // An unmatched selector comes back as a 404 carrying an error code
            Err(ureq::Error::Status(404, response)) => {
                let body: Value = response.into_json().into_diagnostic()?;
                return if error_code(&body) == Some("no such element") {
                    Ok(None)
                } else {
                    Err(miette!("WebDriver error: {}", error_message(&body)).into())
                };
            }
            Err(err) => return Err(wire_error(err).into()),
        };

        let id = element_id(&body)
            .ok_or_else(|| miette!("No element reference in the WebDriver response"))?;
        Ok(Some(ElementHandle(id.to_owned())))
    }
}

impl BrowserSession for WebDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.agent
            .post(&format!("{}/url", self.session_url()))
            .send_json(json!({ "url": url }))
            .map_err(wire_error)?;
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find_element(selector)? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(Error::UnresolvedMedia(format!(
                    "no element matched '{selector}' within {}s",
                    timeout.as_secs()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn read_attribute(&self, element: &ElementHandle, attribute: &str) -> Result<String> {
        let body: Value = self
            .agent
            .get(&format!(
                "{}/element/{}/attribute/{attribute}",
                self.session_url(),
                element.0
            ))
            .call()
            .map_err(wire_error)?
            .into_json()
            .into_diagnostic()?;

        match body.get("value").and_then(Value::as_str) {
            Some(value) => Ok(value.to_owned()),
            // A null value means the element exists but carries no such attribute
            None => Err(Error::UnresolvedMedia(format!(
                "attribute '{attribute}' is missing"
            ))),
        }
    }
}

impl Drop for WebDriver {
    fn drop(&mut self) {
        if !self.closed {
            // Best effort, the driver process cleans up its sessions on exit anyway
            let _ = self.agent.delete(&self.session_url()).call();
        }
    }
}

fn new_session_payload() -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": [
                        "--headless=new",
                        "--disable-gpu",
                        "--mute-audio",
                        "--window-size=1280,720",
                    ],
                },
            },
        },
    })
}

fn wire_error(err: ureq::Error) -> miette::Report {
    match err {
        ureq::Error::Status(code, response) => {
            let detail = response
                .into_json::<Value>()
                .map(|body| error_message(&body))
                .unwrap_or_default();
            miette!("WebDriver request failed with status {code}: {detail}")
        }
        ureq::Error::Transport(err) => miette!("WebDriver transport error: {err}"),
    }
}

fn session_id(body: &Value) -> Option<&str> {
    body.pointer("/value/sessionId")?.as_str()
}

fn element_id(body: &Value) -> Option<&str> {
    body.pointer("/value")?.get(ELEMENT_KEY)?.as_str()
}

fn error_code(body: &Value) -> Option<&str> {
    body.pointer("/value/error")?.as_str()
}

fn error_message(body: &Value) -> String {
    body.pointer("/value/message")
        .and_then(Value::as_str)
        .unwrap_or("no detail")
        .to_owned()
}
