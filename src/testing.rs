//! Shared test fixtures: canned HTTP servers and an in-memory browser
//! session. Each server binds a fresh local port and serves one prepared
//! response to every request, whatever its method or path.

use std::{
    cell::RefCell,
    collections::HashMap,
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    thread,
    time::Duration,
};

use crate::{
    outside::{BrowserSession, ElementHandle},
    resolver::{DURATION_ATTRIBUTE, DURATION_SELECTOR, MEDIA_ATTRIBUTE, MEDIA_SELECTOR},
    result::{Error, Result},
};

#[derive(Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Content-Length to advertise instead of the body's real length
    pub advertised_len: Option<usize>,
}

/// Serve the canned response forever, returning the base URL of the server
pub fn serve(response: CannedResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let response = response.clone();
            thread::spawn(move || handle(stream, response));
        }
    });

    format!("http://{addr}")
}

pub fn serve_json(body: &str) -> String {
    serve(CannedResponse {
        status: 200,
        content_type: "application/json",
        body: body.as_bytes().to_vec(),
        advertised_len: None,
    })
}

pub fn serve_bytes(body: Vec<u8>) -> String {
    serve(CannedResponse {
        status: 200,
        content_type: "application/octet-stream",
        body,
        advertised_len: None,
    })
}

pub fn serve_status(status: u16) -> String {
    serve(CannedResponse {
        status,
        content_type: "text/plain",
        body: Vec::new(),
        advertised_len: None,
    })
}

/// Advertise more bytes than will ever arrive, then close mid-body
pub fn serve_truncated(body: Vec<u8>, advertised_len: usize) -> String {
    serve(CannedResponse {
        status: 200,
        content_type: "application/octet-stream",
        body,
        advertised_len: Some(advertised_len),
    })
}

fn handle(mut stream: TcpStream, response: CannedResponse) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    // Drain any request body, closing with unread bytes would reset the
    // connection before the client reads the response
    let head = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let content_length: usize = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);
    let mut remaining = content_length.saturating_sub(data.len() - header_end);
    while remaining > 0 {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => remaining = remaining.saturating_sub(n),
        }
    }

    let header = format!(
        "HTTP/1.1 {} Fixture\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.advertised_len.unwrap_or(response.body.len())
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
}

/// What the fake browser finds on one clip page
#[derive(Default, Clone)]
pub struct FakePage {
    media_url: Option<String>,
    duration: Option<String>,
}

impl FakePage {
    /// A page whose player carries both a stream source and a duration
    pub fn playable(media_url: &str, duration: &str) -> Self {
        Self {
            media_url: Some(media_url.to_owned()),
            duration: Some(duration.to_owned()),
        }
    }
}

/// In-memory [`BrowserSession`], one canned page per URL
#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: RefCell<String>,
    pub visited: RefCell<Vec<String>>,
}

impl FakeSession {
    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_owned(), page);
        self
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.visited.borrow_mut().push(url.to_owned());
        *self.current.borrow_mut() = url.to_owned();
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<ElementHandle> {
        let current = self.current.borrow();
        let page = self
            .pages
            .get(current.as_str())
            .cloned()
            .unwrap_or_default();

        let present = match selector {
            MEDIA_SELECTOR => page.media_url.is_some(),
            DURATION_SELECTOR => page.duration.is_some(),
            _ => false,
        };
        if present {
            Ok(ElementHandle::dummy())
        } else {
            Err(Error::UnresolvedMedia(format!(
                "no element matched '{selector}'"
            )))
        }
    }

    fn read_attribute(&self, _element: &ElementHandle, attribute: &str) -> Result<String> {
        let current = self.current.borrow();
        let page = &self.pages[current.as_str()];
        let value = match attribute {
            MEDIA_ATTRIBUTE => page.media_url.clone(),
            DURATION_ATTRIBUTE => page.duration.clone(),
            _ => None,
        };
        value.ok_or_else(|| Error::UnresolvedMedia(format!("attribute '{attribute}' is missing")))
    }
}
