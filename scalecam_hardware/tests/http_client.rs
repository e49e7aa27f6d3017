#![cfg(feature = "http")]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use rstest::rstest;
use scalecam_hardware::HttpClient;
use scalecam_hardware::http::CODE_CONNECTION_REFUSED;
use scalecam_traits::HttpTransport;

struct Received {
    request_line: String,
    content_type: String,
    body: Vec<u8>,
}

/// Accept one request, answer with `status` and `reply`, hand back what arrived.
fn serve_once(status: &'static str, reply: &'static str) -> (String, thread::JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api/analyze-food", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut content_type = String::new();
        let mut len = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            match name.to_ascii_lowercase().as_str() {
                "content-type" => content_type = value.trim().to_string(),
                "content-length" => len = value.trim().parse().unwrap(),
                _ => {}
            }
        }
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
            reply.len()
        )
        .unwrap();
        Received {
            request_line: request_line.trim_end().to_string(),
            content_type,
            body,
        }
    });
    (url, handle)
}

#[rstest]
#[case("200 OK", 200)]
#[case("201 Created", 201)]
#[case("500 Internal Server Error", 500)]
fn posts_jpeg_and_returns_status_and_body(#[case] status: &'static str, #[case] code: i32) {
    let (url, server) = serve_once(status, "{\"food\":\"apple\"}");
    let mut client = HttpClient::new(Duration::from_secs(5));

    let resp = client.post(&url, "image/jpeg", &[0xFF, 0xD8, 0x01, 0xFF, 0xD9]);
    assert_eq!(resp.code, code);
    assert_eq!(resp.body, "{\"food\":\"apple\"}");

    let got = server.join().unwrap();
    assert_eq!(got.request_line, "POST /api/analyze-food HTTP/1.1");
    assert_eq!(got.content_type, "image/jpeg");
    assert_eq!(got.body, vec![0xFF, 0xD8, 0x01, 0xFF, 0xD9]);
}

#[rstest]
fn refused_connection_maps_to_negative_code() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let mut client = HttpClient::new(Duration::from_secs(2));
    let resp = client.post(&format!("http://127.0.0.1:{port}/x"), "image/jpeg", &[1]);
    assert_eq!(resp.code, CODE_CONNECTION_REFUSED);
    assert!(!resp.body.is_empty());
}
