// ABOUTME: Loopback HTTP server speaking just enough XML-RPC for client tests.
// ABOUTME: Replies to each OpenNebula method from a scripted queue.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A scripted reply to one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// HTTP 200 with this XML body.
    Xml(String),
    /// Bare HTTP status with an empty body.
    Status(u16),
    /// Never answer.
    Hang,
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Vec<Reply>>,
    received: Vec<(String, String)>,
}

impl Script {
    /// Pop the next reply for `method`; the last one repeats.
    fn next(&mut self, method: &str) -> Reply {
        match self.replies.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => Reply::Xml(fault(-1, &format!("unscripted method {method}"))),
        }
    }
}

pub struct FakeOne {
    url: String,
    script: Arc<Mutex<Script>>,
    task: JoinHandle<()>,
}

impl FakeOne {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/RPC2", listener.local_addr().unwrap());
        let script = Arc::new(Mutex::new(Script::default()));

        let shared = Arc::clone(&script);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _ = serve(stream, shared).await;
                });
            }
        });

        Self { url, script, task }
    }

    /// Queue replies for `method`.
    pub fn on(&self, method: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .replies
            .insert(method.to_string(), replies);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Method names received, in order.
    pub fn methods(&self) -> Vec<String> {
        self.script
            .lock()
            .received
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Request body received for the first call of `method`.
    pub fn body_of(&self, method: &str) -> Option<String> {
        self.script
            .lock()
            .received
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
    }
}

impl Drop for FakeOne {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: TcpStream, script: Arc<Mutex<Script>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (header_end, content_length) = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).into_owned();
            let length = headers
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            break (pos + 4, length);
        }
    };

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).into_owned();
    let method = body
        .split_once("<methodName>")
        .and_then(|(_, rest)| rest.split_once("</methodName>"))
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();

    let reply = {
        let mut script = script.lock();
        script.received.push((method.clone(), body));
        script.next(&method)
    };

    let (status, payload) = match reply {
        Reply::Xml(xml) => (200, xml),
        Reply::Status(status) => (status, String::new()),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return Ok(());
        }
    };

    let response = format!(
        "HTTP/1.1 {status} Scripted\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

// =============================================================================
// Response builders
// =============================================================================

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn envelope(success: bool, value: &str, code: i64) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param><value><array><data>\
<value><boolean>{}</boolean></value>{value}<value><i4>{code}</i4></value>\
</data></array></value></param></params></methodResponse>",
        u8::from(success)
    )
}

/// Successful call returning a string (e.g. an XML document).
pub fn ok_string(text: &str) -> String {
    envelope(true, &format!("<value><string>{}</string></value>", escape(text)), 0)
}

/// Successful call returning an integer (e.g. an object id).
pub fn ok_int(value: i64) -> String {
    envelope(true, &format!("<value><i4>{value}</i4></value>"), 0)
}

/// Call that OpenNebula reports as failed.
pub fn failed(message: &str, code: i64) -> String {
    envelope(
        false,
        &format!("<value><string>{}</string></value>", escape(message)),
        code,
    )
}

/// XML-RPC level fault.
pub fn fault(code: i64, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
<member><name>faultCode</name><value><int>{code}</int></value></member>\
<member><name>faultString</name><value><string>{}</string></value></member>\
</struct></value></fault></methodResponse>",
        escape(message)
    )
}

/// An `<IMAGE>` document.
pub fn image_xml(id: u32, name: &str, state: u32, running_vms: u32) -> String {
    format!(
        "<IMAGE><ID>{id}</ID><UID>0</UID><GID>0</GID><UNAME>oneadmin</UNAME>\
<GNAME>oneadmin</GNAME><NAME><![CDATA[{name}]]></NAME><STATE>{state}</STATE>\
<RUNNING_VMS>{running_vms}</RUNNING_VMS></IMAGE>"
    )
}

/// An `<IMAGE_POOL>` document wrapping `images`.
pub fn pool_xml(images: &[String]) -> String {
    format!("<IMAGE_POOL>{}</IMAGE_POOL>", images.concat())
}
