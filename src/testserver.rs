//! A throwaway HTTP/1.1 server for tests, answering canned responses keyed by request target.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Serves `(target, status, body)` routes on a random local port and returns the base URL.
/// Unknown targets get a 404. The server thread lives until the test process ends.
pub fn serve(routes: Vec<(&str, u16, Vec<u8>)>) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").expect("could not bind test server");
  let addr = listener.local_addr().expect("test server has no address");
  let routes: HashMap<String, (u16, Vec<u8>)> = routes.into_iter()
    .map(|(target, status, body)| (target.to_string(), (status, body)))
    .collect();

  thread::spawn(move || {
    for stream in listener.incoming() {
      let Ok(mut stream) = stream else { continue };
      let mut request = Vec::new();
      let mut chunk = [0u8; 1024];
      while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
          Ok(0) | Err(_) => break,
          Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
      }
      let request = String::from_utf8_lossy(&request);
      let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
      let (status, body) = routes.get(&target).cloned().unwrap_or((404, b"not found".to_vec()));
      let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        if status == 200 { "OK" } else { "Error" },
        body.len());
      let _ = stream.write_all(head.as_bytes());
      let _ = stream.write_all(&body);
      let _ = stream.flush();
    }
  });

  format!("http://{}", addr)
}
