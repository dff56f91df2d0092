//! 集成测试共用工具：进程内 HTTP 桩服务 + 测试图片。

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use photo_enhance::enhance::{EnhanceConfig, HttpEnhancementClient, SourceImage};

/// 读取完整 HTTP 请求（支持 Content-Length 与 chunked 两种请求体）。
fn read_full_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = stream.read(&mut buf).expect("read request failed");
        if n == 0 {
            return request;
        }
        request.extend_from_slice(&buf[..n]);

        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let body_len = request.len() - header_end - 4;

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());

        match content_length {
            Some(len) if body_len >= len => return request,
            Some(_) => continue,
            None if request.ends_with(b"0\r\n\r\n") => return request,
            None => continue,
        }
    }
}

/// 启动只应答一次的桩服务，返回 base_url 与“收到的原始请求”。
pub fn spawn_enhance_server(
    status_line: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
) -> (String, thread::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let addr = listener.local_addr().expect("read local addr failed");

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let request = read_full_request(&mut stream);

        let headers = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            content_type,
            body.len()
        );
        stream.write_all(headers.as_bytes()).expect("write headers failed");
        stream.write_all(&body).expect("write body failed");
        stream.flush().expect("flush failed");

        request
    });

    (format!("http://127.0.0.1:{}", addr.port()), server)
}

pub fn test_config(base_url: String) -> EnhanceConfig {
    EnhanceConfig {
        base_url,
        use_system_proxy: false,
        ..EnhanceConfig::default()
    }
}

pub fn http_client(config: &EnhanceConfig) -> HttpEnhancementClient {
    HttpEnhancementClient::new(config).expect("client init failed")
}

pub fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 251) as u8, ((x + y) % 251) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, format)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub fn jpeg_source(file_name: &str, width: u32, height: u32) -> SourceImage {
    SourceImage::new(file_name, "image/jpeg", encode_image(width, height, ImageFormat::Jpeg))
}
