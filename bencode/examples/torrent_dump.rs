use std::env;
use std::fs;

use bencode::{Decoder, Torrent};
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: torrent_dump <file.torrent>");
        std::process::exit(2);
    };

    let raw_bytes = fs::read(&path).unwrap();

    let value = Decoder::new(&raw_bytes[..]).decode_value().unwrap();
    println!("{value}");

    let torrent: Torrent = bencode::decode_bytes(&raw_bytes).unwrap();
    info!(
        announce = ?torrent.announce,
        name = ?torrent.info.name,
        piece_length = torrent.info.piece_length,
        files = torrent.info.files.len(),
        "Parsed torrent"
    );
}
