use anyhow::{Context, Result};
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, Take};

use crate::constants::{MAX_BODY_BYTES, MAX_HEAD_BYTES};
use crate::error::CustomError;

#[derive(Debug, PartialEq)]
pub enum Method {
    GET,
    POST,
}

impl TryFrom<&str> for Method {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, anyhow::Error> {
        match value {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(CustomError::MethodNotAllowed.into()),
        }
    }
}

pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Request {
    pub async fn new<Reader>(reader: Reader) -> Result<Self>
    where
        Reader: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut head = (&mut reader).take(MAX_HEAD_BYTES);

        // Method and path
        let first = read_head_line(&mut head)
            .await
            .context("Failed to read request line")?;
        let mut request_parts = first.split_whitespace();
        let method: Method = request_parts
            .next()
            .context("Empty Request")?
            .try_into()?;
        let target = request_parts.next().context("No Path")?;
        let path = target.split('?').next().unwrap_or(target);

        // Headers
        let mut headers = HashMap::new();
        loop {
            let line = read_head_line(&mut head)
                .await
                .context("Failed to read header")?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_lowercase(), v.trim().to_string());
            }
        }

        // Body
        let length = match headers.get("content-length") {
            Some(value) => value.parse::<usize>().context("Invalid Content-Length")?,
            None => 0,
        };
        anyhow::ensure!(length <= MAX_BODY_BYTES, "Body too large");
        let mut body = vec![0; length];
        reader
            .read_exact(&mut body)
            .await
            .context("Truncated body")?;

        Ok(Request {
            method,
            path: path.into(),
            headers,
            body: String::from_utf8(body).context("Body is not UTF-8")?,
        })
    }
}

/// Reads one line of the request head. A line cut short by the head limit
/// is an error; an empty string means the peer closed the stream.
async fn read_head_line<Reader>(head: &mut Take<Reader>) -> Result<String>
where
    Reader: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    head.read_line(&mut line).await?;
    anyhow::ensure!(
        line.ends_with('\n') || head.limit() > 0,
        "Request head too large"
    );
    Ok(line)
}
