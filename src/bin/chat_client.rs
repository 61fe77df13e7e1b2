//! Interactive terminal client for the RAX chat server.
//!
//! Usage: `chat_client [ip] [port]` (defaults to 127.0.0.1:8888).
//! Lines typed on stdin are sent as-is; `quit` exits.

use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_IP: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8888;
const BUFFER_SIZE: usize = 2048;

fn print_instructions(addr: &str) {
    println!("Connected to chat server at {}", addr);
    println!("Commands:");
    println!("- Type '@nickname message' for private messages");
    println!("- Type any other message for broadcast");
    println!("- Type 'quit' to exit");
    println!("----------------------------------------");
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let ip = args.next().unwrap_or_else(|| DEFAULT_IP.to_string());
    let port = match args.next().map(|p| p.parse::<u16>()) {
        None => DEFAULT_PORT,
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            eprintln!("ERROR: invalid port");
            return ExitCode::FAILURE;
        }
    };
    let addr = format!("{}:{}", ip, port);

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("ERROR: connect to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    print_instructions(&addr);

    let (mut reader, mut writer) = stream.into_split();

    // Server output is printed verbatim; prompts have no trailing newline
    let receive = async move {
        let mut stdout = tokio::io::stdout();
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stdout.write_all(&buffer[..n]).await.is_err() {
                        break;
                    }
                    let _ = stdout.flush().await;
                }
            }
        }
    };

    let send = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line == "quit" {
                break;
            }
            if writer.write_all(format!("{}\n", line).as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    };

    tokio::select! {
        _ = receive => println!("\nServer closed the connection"),
        _ = send => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    println!("\nBye");
    // A blocking stdin read would otherwise hold up runtime shutdown.
    std::process::exit(0);
}
