//! Minimal HTTP/1.1 server for exercising `CurlSession` end to end.
//!
//! Serves listing pages at `/list<id>?page=N` (HTML with one anchor per file)
//! and files at `/files/<name>`. When a cookie is configured, requests without
//! exactly that `Cookie` header get 401.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub target: String,
    pub referer: Option<String>,
    pub cookie: Option<String>,
}

#[derive(Default)]
struct Site {
    pages: HashMap<u32, Vec<String>>,
    files: HashMap<String, Vec<u8>>,
    cookie: Option<String>,
    seen: Vec<SeenRequest>,
}

pub struct SiteServer {
    /// e.g. "http://127.0.0.1:12345/"
    pub base: String,
    site: Arc<Mutex<Site>>,
}

impl SiteServer {
    pub fn page(&self, page: u32, hrefs: &[&str]) {
        self.site
            .lock()
            .unwrap()
            .pages
            .insert(page, hrefs.iter().map(|h| h.to_string()).collect());
    }

    pub fn file(&self, name: &str, body: &[u8]) {
        self.site
            .lock()
            .unwrap()
            .files
            .insert(name.to_string(), body.to_vec());
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.site.lock().unwrap().seen.clone()
    }
}

/// Starts a server in a background thread; it runs until the process exits.
pub fn start(cookie: Option<&str>) -> SiteServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let site = Arc::new(Mutex::new(Site {
        cookie: cookie.map(str::to_string),
        ..Site::default()
    }));
    let shared = Arc::clone(&site);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let site = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &site));
        }
    });
    SiteServer {
        base: format!("http://127.0.0.1:{port}/"),
        site,
    }
}

fn handle(mut stream: TcpStream, site: &Mutex<Site>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let seen = parse_request(request);
    let (status, content_type, body) = respond(site, &seen);
    site.lock().unwrap().seen.push(seen);

    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn respond(site: &Mutex<Site>, req: &SeenRequest) -> (&'static str, &'static str, Vec<u8>) {
    let site = site.lock().unwrap();
    if site.cookie.is_some() && site.cookie != req.cookie {
        return ("401 Unauthorized", "text/html", b"<html>verify you are human</html>".to_vec());
    }
    if let Some(name) = req.target.strip_prefix("/files/") {
        return match site.files.get(name) {
            Some(body) => ("200 OK", "application/pdf", body.clone()),
            None => ("404 Not Found", "text/html", b"<html>missing</html>".to_vec()),
        };
    }
    if req.target.starts_with("/list") {
        let page = req
            .target
            .rsplit("page=")
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0);
        let links: String = site
            .pages
            .get(&page)
            .map(|hrefs| {
                hrefs
                    .iter()
                    .map(|h| format!("<li><a href=\"{h}\">{h}</a></li>"))
                    .collect()
            })
            .unwrap_or_default();
        let html = format!("<html><body><a href=\"/\">Home</a><ul>{links}</ul></body></html>");
        return ("200 OK", "text/html; charset=utf-8", html.into_bytes());
    }
    ("404 Not Found", "text/html", Vec::new())
}

fn parse_request(request: &str) -> SeenRequest {
    let mut lines = request.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let mut seen = SeenRequest {
        target,
        referer: None,
        cookie: None,
    };
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = Some(value.trim().to_string());
            if name.eq_ignore_ascii_case("referer") {
                seen.referer = value;
            } else if name.eq_ignore_ascii_case("cookie") {
                seen.cookie = value;
            }
        }
    }
    seen
}
