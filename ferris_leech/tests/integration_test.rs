use ferris_leech::torrent::{
    client::{
        download_coordinator::{self, DownloadError, DownloadMode},
        entry_files_management::EntryArgs,
    },
    data::{config_file_data::ConfigFileData, tracker_response_data::PeerEndpoint},
    torrent_handler,
};
use sha1::{Digest, Sha1};
use shared::{
    parsers::{
        bencoding::{self, values::ValuesBencoding},
        p2p::{
            self,
            constants::PSTR_STRING_HANDSHAKE,
            message::{Handshake, InfoHash, P2PMessage},
        },
    },
    torrent_file_data::TorrentFileData,
};
use std::{
    collections::HashMap,
    env,
    error::Error,
    fs,
    io::{Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    path::PathBuf,
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

const PIECE_LENGTH: u64 = 16384;
const TOTAL_LENGTH: usize = 40000;
const TEST_INFO_HASH: InfoHash = [7; 20];
const SEEDER_PEER_ID: [u8; 20] = *b"-SEED01-000000000000";

type SeederHandle = JoinHandle<Result<SeederStats, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeederMode {
    Complete,
    /// Espera antes de responder el handshake.
    Delayed(Duration),
    /// Cierra la conexion luego de completar esa cantidad de piezas.
    DisconnectAfterPieces(usize),
    /// Responde el primer request con la mitad del bloque y cierra la conexion.
    DisconnectMidPiece,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SeederStats {
    requests: usize,
    served_pieces: usize,
}

//==========================================
// FUNCIONES AUXILIARES:
//
fn file_content() -> Vec<u8> {
    (0..TOTAL_LENGTH).map(|i| (i % 251) as u8).collect()
}

fn sha1_pieces(content: &[u8]) -> Vec<u8> {
    content
        .chunks(PIECE_LENGTH as usize)
        .flat_map(|piece| {
            let mut hasher = Sha1::new();
            hasher.update(piece);
            hasher.finalize().to_vec()
        })
        .collect()
}

fn test_torrent(name: &str, content: &[u8]) -> TorrentFileData {
    TorrentFileData {
        url_tracker_main: "http://127.0.0.1/announce".to_string(),
        name: name.to_string(),
        sha1_pieces: sha1_pieces(content),
        sha1_info_hash: TEST_INFO_HASH,
        piece_length: PIECE_LENGTH,
        total_length: content.len() as u64,
        total_amount_of_pieces: 3,
    }
}

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(name)
}

fn read_frame(stream: &mut TcpStream) -> Result<P2PMessage, String> {
    let mut frame = vec![0; 4];
    stream
        .read_exact(&mut frame)
        .map_err(|err| err.to_string())?;
    let length = p2p::decoder::decode_length_prefix(&frame).map_err(|err| err.to_string())?;
    let mut body = vec![0; length as usize];
    stream.read_exact(&mut body).map_err(|err| err.to_string())?;
    frame.extend(body);
    p2p::decoder::from_bytes(&frame).map_err(|err| err.to_string())
}

fn write_msg(stream: &mut TcpStream, msg: P2PMessage) -> Result<(), String> {
    let bytes = p2p::encoder::to_bytes(msg).map_err(|err| err.to_string())?;
    stream.write_all(&bytes).map_err(|err| err.to_string())
}

///
/// Levanta un peer que posee el archivo completo y responde los requests recibidos segun `mode`.
///
fn spawn_seeder(
    info_hash: InfoHash,
    content: Vec<u8>,
    mode: SeederMode,
) -> Result<(SocketAddr, SeederHandle), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?;
    let handle = thread::spawn(move || -> Result<SeederStats, String> {
        let (mut stream, _) = listener.accept().map_err(|err| err.to_string())?;
        let mut handshake = [0; 68];
        stream
            .read_exact(&mut handshake)
            .map_err(|err| err.to_string())?;
        if let SeederMode::Delayed(delay) = mode {
            thread::sleep(delay);
        }
        let bytes = p2p::encoder::handshake_to_bytes(&Handshake {
            protocol_str: PSTR_STRING_HANDSHAKE.to_string(),
            info_hash,
            peer_id: SEEDER_PEER_ID,
        })
        .map_err(|err| err.to_string())?;
        stream.write_all(&bytes).map_err(|err| err.to_string())?;
        write_msg(
            &mut stream,
            P2PMessage::Bitfield {
                bitfield: vec![0b1110_0000],
            },
        )?;
        write_msg(&mut stream, P2PMessage::Unchoke)?;

        let mut stats = SeederStats::default();
        loop {
            let msg = match read_frame(&mut stream) {
                Ok(msg) => msg,
                // El cliente cerro la conexion
                Err(_) => return Ok(stats),
            };
            if let P2PMessage::Request {
                piece_index,
                beginning_byte_index,
                amount_of_bytes,
            } = msg
            {
                stats.requests += 1;
                let begin = piece_index as usize * PIECE_LENGTH as usize
                    + beginning_byte_index as usize;
                let mut end = begin + amount_of_bytes as usize;
                if mode == SeederMode::DisconnectMidPiece {
                    end = begin + amount_of_bytes as usize / 2;
                }
                let piece_end =
                    ((piece_index as usize + 1) * PIECE_LENGTH as usize).min(content.len());
                write_msg(
                    &mut stream,
                    P2PMessage::Piece {
                        piece_index,
                        beginning_byte_index,
                        block: content[begin..end].to_vec(),
                    },
                )?;
                if mode == SeederMode::DisconnectMidPiece {
                    return Ok(stats);
                }
                if end == piece_end {
                    stats.served_pieces += 1;
                    if mode == SeederMode::DisconnectAfterPieces(stats.served_pieces) {
                        return Ok(stats);
                    }
                }
            }
        }
    });
    Ok((address, handle))
}

fn endpoint(address: SocketAddr) -> PeerEndpoint {
    PeerEndpoint {
        ip: address.ip(),
        port: address.port(),
    }
}

fn join_seeder(handle: SeederHandle) -> Result<SeederStats, Box<dyn Error>> {
    let stats = handle
        .join()
        .map_err(|_| "[TestingError] Seeder join error".to_string())??;
    Ok(stats)
}

/// Indices de las piezas registradas en el log, en el orden en que se entregaron.
fn logged_piece_indexes(log_lines: &[String]) -> Vec<u32> {
    log_lines
        .iter()
        .filter_map(|line| line.strip_prefix("[PIECE] Pieza "))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|index| index.parse().ok())
        .collect()
}

//==========================================
// TESTS:
//
mod tests_download {
    use super::*;

    #[test]
    fn download_from_two_peers_ok() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("dos_peers.bin", &content);
        let dir = temp_path("ferris_leech_it_two_peers");
        let (seeder_1, handle_1) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::Complete)?;
        let (seeder_2, handle_2) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::Complete)?;
        let (logger_sender, logger_receiver) = mpsc::channel();

        let downloaded = download_coordinator::download_torrent(
            &torrent,
            &[endpoint(seeder_1), endpoint(seeder_2)],
            [1; 20],
            DownloadMode::Fresh {
                output_dir: dir.display().to_string(),
            },
            logger_sender,
        )?;

        assert_eq!(3, downloaded);
        assert_eq!(content, fs::read(dir.join("dos_peers.bin"))?);
        let served = join_seeder(handle_1)?.served_pieces + join_seeder(handle_2)?.served_pieces;
        assert_eq!(3, served);

        let log_lines: Vec<String> = logger_receiver.try_iter().collect();
        let mut indexes = logged_piece_indexes(&log_lines);
        indexes.sort_unstable();
        assert_eq!(vec![0, 1, 2], indexes);
        assert!(log_lines
            .iter()
            .any(|line| line.starts_with("[PROGRESS] 3/3")));
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn download_survives_a_peer_disconnecting_after_a_piece() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("peer_caido.bin", &content);
        let dir = temp_path("ferris_leech_it_peer_disconnect");
        let (flaky, flaky_handle) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::DisconnectAfterPieces(1))?;
        let (seeder, seeder_handle) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::Complete)?;
        let (logger_sender, logger_receiver) = mpsc::channel();

        let downloaded = download_coordinator::download_torrent(
            &torrent,
            &[endpoint(flaky), endpoint(seeder)],
            [1; 20],
            DownloadMode::Fresh {
                output_dir: dir.display().to_string(),
            },
            logger_sender,
        )?;

        assert_eq!(3, downloaded);
        assert_eq!(content, fs::read(dir.join("peer_caido.bin"))?);
        assert!(join_seeder(flaky_handle)?.served_pieces <= 1);
        join_seeder(seeder_handle)?;

        let mut indexes = logged_piece_indexes(&logger_receiver.try_iter().collect::<Vec<_>>());
        indexes.sort_unstable();
        assert_eq!(vec![0, 1, 2], indexes);
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn piece_cut_mid_download_is_completed_by_another_peer() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("pieza_cortada.bin", &content);
        let dir = temp_path("ferris_leech_it_mid_piece");
        let (flaky, flaky_handle) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::DisconnectMidPiece)?;
        // El seeder sano demora el handshake para que el otro worker tome la primera pieza.
        let (seeder, seeder_handle) = spawn_seeder(
            TEST_INFO_HASH,
            content.clone(),
            SeederMode::Delayed(Duration::from_millis(300)),
        )?;
        let (logger_sender, logger_receiver) = mpsc::channel();

        let downloaded = download_coordinator::download_torrent(
            &torrent,
            &[endpoint(flaky), endpoint(seeder)],
            [1; 20],
            DownloadMode::Fresh {
                output_dir: dir.display().to_string(),
            },
            logger_sender,
        )?;

        assert_eq!(3, downloaded);
        assert_eq!(content, fs::read(dir.join("pieza_cortada.bin"))?);
        assert_eq!(
            SeederStats {
                requests: 1,
                served_pieces: 0,
            },
            join_seeder(flaky_handle)?
        );
        assert_eq!(3, join_seeder(seeder_handle)?.served_pieces);

        // Cada pieza se entrego una unica vez, y todas por el seeder sano.
        let log_lines: Vec<String> = logger_receiver
            .try_iter()
            .filter(|line| line.starts_with("[PIECE]"))
            .collect();
        assert!(log_lines
            .iter()
            .all(|line| line.ends_with(&seeder.to_string())));
        let mut indexes = logged_piece_indexes(&log_lines);
        indexes.sort_unstable();
        assert_eq!(vec![0, 1, 2], indexes);
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn download_with_wrong_info_hash_peers_error() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("otro_hash.bin", &content);
        let dir = temp_path("ferris_leech_it_wrong_hash");
        let (seeder, handle) = spawn_seeder([9; 20], content, SeederMode::Complete)?;
        let (logger_sender, _logger_receiver) = mpsc::channel();

        let result = download_coordinator::download_torrent(
            &torrent,
            &[endpoint(seeder)],
            [1; 20],
            DownloadMode::Fresh {
                output_dir: dir.display().to_string(),
            },
            logger_sender,
        );

        assert!(matches!(result, Err(DownloadError::NoPeersLeft(_))));
        let _ = handle.join();
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}

mod tests_resume {
    use super::*;

    #[test]
    fn resume_downloads_only_missing_pieces() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("parcial.bin", &content);
        let partial = temp_path("ferris_leech_it_partial.bin");
        let mut on_disk = content[..PIECE_LENGTH as usize].to_vec();
        on_disk.resize(TOTAL_LENGTH, 0xaa);
        fs::write(&partial, on_disk)?;
        let (seeder, handle) =
            spawn_seeder(TEST_INFO_HASH, content.clone(), SeederMode::Complete)?;
        let (logger_sender, _logger_receiver) = mpsc::channel();

        let downloaded = download_coordinator::download_torrent(
            &torrent,
            &[endpoint(seeder)],
            [1; 20],
            DownloadMode::Resume {
                partial_file: partial.display().to_string(),
            },
            logger_sender,
        )?;

        assert_eq!(2, downloaded);
        assert_eq!(content, fs::read(&partial)?);
        assert_eq!(2, join_seeder(handle)?.served_pieces);
        fs::remove_file(&partial)?;
        Ok(())
    }

    #[test]
    fn resume_complete_file_error() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let torrent = test_torrent("completo.bin", &content);
        let partial = temp_path("ferris_leech_it_complete.bin");
        fs::write(&partial, &content)?;
        let (logger_sender, _logger_receiver) = mpsc::channel();

        let result = download_coordinator::download_torrent(
            &torrent,
            &[],
            [1; 20],
            DownloadMode::Resume {
                partial_file: partial.display().to_string(),
            },
            logger_sender,
        );

        assert!(matches!(result, Err(DownloadError::AlreadyComplete(_))));
        assert_eq!(content, fs::read(&partial)?);
        fs::remove_file(&partial)?;
        Ok(())
    }
}

mod tests_torrent_handler {
    use super::*;

    fn bencoded_torrent(announce: &str, content: &[u8]) -> Vec<u8> {
        let mut info: HashMap<Vec<u8>, ValuesBencoding> = HashMap::new();
        info.insert(
            b"name".to_vec(),
            ValuesBencoding::String(b"completo_e2e.bin".to_vec()),
        );
        info.insert(
            b"piece length".to_vec(),
            ValuesBencoding::Integer(PIECE_LENGTH as i64),
        );
        info.insert(
            b"length".to_vec(),
            ValuesBencoding::Integer(content.len() as i64),
        );
        info.insert(
            b"pieces".to_vec(),
            ValuesBencoding::String(sha1_pieces(content)),
        );

        let mut torrent = HashMap::new();
        torrent.insert(
            b"announce".to_vec(),
            ValuesBencoding::String(announce.as_bytes().to_vec()),
        );
        torrent.insert(b"info".to_vec(), ValuesBencoding::Dic(info));
        bencoding::encoder::from_dic(&torrent)
    }

    fn spawn_tracker(
        listener: TcpListener,
        peers: Vec<SocketAddr>,
    ) -> JoinHandle<Result<String, String>> {
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().map_err(|err| err.to_string())?;
            let mut request = vec![];
            let mut buf = [0; 512];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut buf).map_err(|err| err.to_string())?;
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }

            let mut compact = vec![];
            for peer in peers {
                if let std::net::IpAddr::V4(ip) = peer.ip() {
                    compact.extend_from_slice(&ip.octets());
                }
                compact.extend_from_slice(&peer.port().to_be_bytes());
            }
            let mut response = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
            response.extend(format!("d8:intervali1800e5:peers{}:", compact.len()).as_bytes());
            response.extend(compact);
            response.push(b'e');
            stream.write_all(&response).map_err(|err| err.to_string())?;
            Ok(String::from_utf8_lossy(&request).to_string())
        })
    }

    #[test]
    fn handle_torrent_from_args_end_to_end_ok() -> Result<(), Box<dyn Error>> {
        let content = file_content();
        let work_dir = temp_path("ferris_leech_it_end_to_end");
        fs::create_dir_all(&work_dir)?;

        let tracker_listener = TcpListener::bind("127.0.0.1:0")?;
        let announce = format!(
            "http://127.0.0.1:{}/announce",
            tracker_listener.local_addr()?.port()
        );
        let torrent_path = work_dir.join("e2e.torrent");
        fs::write(&torrent_path, bencoded_torrent(&announce, &content))?;
        let info_hash = torrent_handler::read_torrent(&torrent_path.display().to_string())?
            .get_info_hash();

        let (seeder, seeder_handle) = spawn_seeder(info_hash, content.clone(), SeederMode::Complete)?;
        let tracker = spawn_tracker(tracker_listener, vec![seeder]);

        let config_path = work_dir.join("config.txt");
        let log_dir = work_dir.join("logs");
        let download_dir = work_dir.join("downloads");
        fs::write(
            &config_path,
            format!(
                "port 6881\ndownload_path {}\nlog_path {}\n",
                download_dir.display(),
                log_dir.display()
            ),
        )?;
        let config_data = ConfigFileData::new(&config_path.display().to_string())?;
        let entry_args = EntryArgs {
            torrent_path: torrent_path.display().to_string(),
            output_dir: None,
            resume_file: None,
        };

        let downloaded = torrent_handler::handle_torrent_from_args(&entry_args, &config_data)?;

        assert_eq!(3, downloaded);
        assert_eq!(content, fs::read(download_dir.join("completo_e2e.bin"))?);
        let request = tracker
            .join()
            .map_err(|_| "[TestingError] Tracker join error".to_string())??;
        assert!(request.starts_with("GET /announce?"));
        assert!(request.contains("compact=1"));
        join_seeder(seeder_handle)?;

        let logs = fs::read_to_string(log_dir.join("completo_e2e.bin-logs.txt"))?;
        assert!(logs.contains("[START]"));
        assert!(logs.contains("[END]"));
        fs::remove_dir_all(&work_dir)?;
        Ok(())
    }
}
