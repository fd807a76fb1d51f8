use bytes::Bytes;
use wirevalue::{Value, record};

record! {
    /// Torrent file metadata.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Torrent {
        pub announce: String => bencode = "announce",
        pub announce_list: Vec<Vec<String>> => bencode = "announce-list,omitempty",
        pub created_by: String => bencode = "created by,omitempty",
        pub creation_date: i64 => bencode = "creation date,omitempty",
        pub comment: String => bencode = "comment,omitempty",
        pub encoding: String => bencode = "encoding,omitempty",
        pub info: FileInfo => bencode = "info",
        pub nodes: Value => bencode = "nodes,omitempty",
    }
}

record! {
    /// Shared info dictionary: single-file torrents fill `length`,
    /// multi-file torrents fill `files`.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct FileInfo {
        pub files: Vec<File> => bencode = "files,omitempty",
        pub name: String => bencode = "name",
        pub length: i64 => bencode = "length,omitempty",
        pub ed2k: String => bencode = "ed2k,omitempty",
        pub md5sum: String => bencode = "md5sum,omitempty",
        pub file_hash: String => bencode = "filehash,omitempty",
        pub piece_length: i64 => bencode = "piece length",
        pub pieces: Bytes => bencode = "pieces",
        pub file_duration: Vec<i64> => bencode = "file-duration,omitempty",
        pub file_media: Vec<i64> => bencode = "file-media,omitempty",
        pub profiles: MetaData => bencode = "profiles,omitempty",
    }
}

record! {
    /// Media metadata carried by some publishers.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct MetaData {
        pub acodec: String => bencode = "acodec",
        pub vcodec: String => bencode = "vcodec",
        pub height: i64 => bencode = "height",
        pub width: i64 => bencode = "width",
    }
}

record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct File {
        pub length: i64 => bencode = "length",
        pub md5sum: String => bencode = "md5sum,omitempty",
        pub path: Vec<String> => bencode = "path",
    }
}
