//! Image loading for URL texture sources.
//!
//! Loads are fire and forget. An [`ImageLoader`] receives a [`LoadSink`]
//! and completes it from any thread; completions queue on a channel that
//! the renderer drains in `poll_texture_loads` on its own thread.
//!
//! [`SourceLoader`], the default, fetches `http` and `https` URLs with
//! [`HttpImageLoader`] and reads `file://` URLs and plain paths with
//! [`FileImageLoader`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use justdraw_canvas::{CanvasError, ImageData};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::webgl::TextureId;

/// Why an image load did not produce pixels.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    InvalidData(#[from] CanvasError),

    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),

    /// The loader dropped the request without completing it.
    #[error("Image load abandoned")]
    Abandoned,
}

/// Decode PNG, JPEG, GIF, WebP or BMP bytes into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<ImageData, LoadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData::from_data(width, height, rgba.into_raw())?)
}

/// The URL scheme of `source`, lowercased; `None` for plain paths.
fn scheme(source: &str) -> Option<String> {
    source
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
}

// ==================== Sink ====================

pub(crate) struct Completion {
    pub texture: TextureId,
    pub source: String,
    pub result: Result<ImageData, LoadError>,
}

/// The receiving end of one load request.
///
/// Dropping a sink without calling [`complete`](Self::complete) reports the
/// load as [`LoadError::Abandoned`].
pub struct LoadSink {
    texture: TextureId,
    source: String,
    tx: Option<UnboundedSender<Completion>>,
}

impl LoadSink {
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// URL or path to load.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn complete(mut self, result: Result<ImageData, LoadError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<ImageData, LoadError>) {
        if let Some(tx) = self.tx.take() {
            let completion = Completion {
                texture: self.texture,
                source: std::mem::take(&mut self.source),
                result,
            };
            // The renderer may be gone already
            let _ = tx.send(completion);
        }
    }
}

impl Drop for LoadSink {
    fn drop(&mut self) {
        self.send(Err(LoadError::Abandoned));
    }
}

impl fmt::Debug for LoadSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadSink")
            .field("texture", &self.texture)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Run `work` on a named worker thread and complete `sink` with its result.
fn spawn_load<F>(sink: LoadSink, work: F)
where
    F: FnOnce(&str) -> Result<ImageData, LoadError> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("justdraw-image".to_string())
        .spawn(move || {
            let result = work(sink.source());
            sink.complete(result);
        });
    // On failure the closure, and the sink with it, is dropped and the
    // load reports as abandoned.
    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn image loader thread");
    }
}

// ==================== Loaders ====================

/// Fetches and decodes texture sources.
pub trait ImageLoader {
    /// Start loading `sink.source()`. Must not block.
    fn load(&self, sink: LoadSink);
}

/// Reads local files (plain paths or `file://` URLs) on a background
/// thread and decodes them with the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    root: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative sources against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &str) -> Result<PathBuf, LoadError> {
        let path = match scheme(source).as_deref() {
            Some("file") => source.split_once("://").map_or(Path::new(source), |(_, rest)| Path::new(rest)),
            Some(_) => return Err(LoadError::UnsupportedSource(source.to_string())),
            None => Path::new(source),
        };
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, sink: LoadSink) {
        let path = match self.resolve(sink.source()) {
            Ok(path) => path,
            Err(e) => return sink.complete(Err(e)),
        };

        spawn_load(sink, move |_| {
            debug!(path = %path.display(), "decoding image");
            let bytes = std::fs::read(&path)?;
            decode_image(&bytes)
        });
    }
}

/// Fetches `http` and `https` URLs with a blocking `reqwest` client on a
/// background thread. Non-success statuses fail the load.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    timeout: Duration,
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

impl HttpImageLoader {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch(url: &str, timeout: Duration) -> Result<ImageData, LoadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("justdraw/", env!("CARGO_PKG_VERSION")))
            .build()?;
        debug!(url, "fetching image");
        let bytes = client.get(url).send()?.error_for_status()?.bytes()?;
        decode_image(&bytes)
    }
}

impl ImageLoader for HttpImageLoader {
    fn load(&self, sink: LoadSink) {
        if !matches!(scheme(sink.source()).as_deref(), Some("http" | "https")) {
            let source = sink.source().to_string();
            return sink.complete(Err(LoadError::UnsupportedSource(source)));
        }
        let timeout = self.timeout;
        spawn_load(sink, move |url| Self::fetch(url, timeout));
    }
}

/// Dispatches on the source's scheme: `http` and `https` go over the
/// network, `file://` URLs and plain paths to the file system. Anything
/// else fails with [`LoadError::UnsupportedSource`].
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    file: FileImageLoader,
    http: HttpImageLoader,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_loader(mut self, file: FileImageLoader) -> Self {
        self.file = file;
        self
    }

    pub fn with_http_loader(mut self, http: HttpImageLoader) -> Self {
        self.http = http;
        self
    }
}

impl ImageLoader for SourceLoader {
    fn load(&self, sink: LoadSink) {
        match scheme(sink.source()).as_deref() {
            Some("http" | "https") => self.http.load(sink),
            _ => self.file.load(sink),
        }
    }
}

// ==================== Queue ====================

/// Loads started by one renderer and their pending completions.
pub(crate) struct TextureLoads {
    loader: Box<dyn ImageLoader>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    pending: usize,
}

impl TextureLoads {
    pub fn new(loader: Box<dyn ImageLoader>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            loader,
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn set_loader(&mut self, loader: Box<dyn ImageLoader>) {
        self.loader = loader;
    }

    pub fn start(&mut self, texture: TextureId, source: &str) {
        self.pending += 1;
        self.loader.load(LoadSink {
            texture,
            source: source.to_string(),
            tx: Some(self.tx.clone()),
        });
    }

    /// Completions received so far, without waiting.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        self.pending = self.pending.saturating_sub(completions.len());
        completions
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl fmt::Debug for TextureLoads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureLoads")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    struct Immediate;

    impl ImageLoader for Immediate {
        fn load(&self, sink: LoadSink) {
            let image = ImageData::new(4, 2);
            sink.complete(Ok(image));
        }
    }

    struct Forgetful;

    impl ImageLoader for Forgetful {
        fn load(&self, _sink: LoadSink) {}
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Answer one HTTP request on a local port with `status` and `body`.
    /// Returns the URL to request.
    pub(crate) fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        format!("http://{addr}/grass.png")
    }

    fn wait_for(loads: &mut TextureLoads) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut done = Vec::new();
        while done.is_empty() && Instant::now() < deadline {
            done = loads.drain();
            std::thread::sleep(Duration::from_millis(5));
        }
        done
    }

    #[test]
    fn test_decode_png() {
        let data = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!((data.width, data.height), (3, 2));
        assert_eq!(&data.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_scheme() {
        assert_eq!(scheme("HTTPS://example.com/a.png").as_deref(), Some("https"));
        assert_eq!(scheme("file:///tmp/a.png").as_deref(), Some("file"));
        assert_eq!(scheme("img/a.png"), None);
    }

    #[test]
    fn test_queue_counts_pending() {
        let mut loads = TextureLoads::new(Box::new(Immediate));
        loads.start(TextureId(0), "a.png");
        assert_eq!(loads.pending(), 1);

        let done = loads.drain();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].texture, TextureId(0));
        assert_eq!(done[0].source, "a.png");
        assert_eq!(loads.pending(), 0);
    }

    #[test]
    fn test_dropped_sink_is_abandoned() {
        let mut loads = TextureLoads::new(Box::new(Forgetful));
        loads.start(TextureId(1), "b.png");
        let done = loads.drain();
        assert!(matches!(done[0].result, Err(LoadError::Abandoned)));
    }

    #[test]
    fn test_resolve() {
        let loader = FileImageLoader::with_root("/assets");
        assert_eq!(loader.resolve("img/a.png").unwrap(), PathBuf::from("/assets/img/a.png"));
        assert_eq!(loader.resolve("file:///tmp/b.png").unwrap(), PathBuf::from("/tmp/b.png"));
        assert!(matches!(
            loader.resolve("https://example.com/c.png"),
            Err(LoadError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_file_loader() {
        let path = std::env::temp_dir().join(format!("justdraw-loader-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(2, 2)).unwrap();

        let mut loads = TextureLoads::new(Box::new(FileImageLoader::new()));
        loads.start(TextureId(2), path.to_str().unwrap());
        let mut done = wait_for(&mut loads);
        let _ = std::fs::remove_file(&path);

        let image = done.pop().unwrap().result.unwrap();
        assert_eq!((image.width, image.height), (2, 2));
    }

    #[test]
    fn test_missing_file() {
        let mut loads = TextureLoads::new(Box::new(FileImageLoader::new()));
        loads.start(TextureId(3), "/definitely/not/here.png");
        let done = wait_for(&mut loads);
        assert!(matches!(done[0].result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_source_loader_fetches_http() {
        let url = serve_once("200 OK", png_bytes(4, 2));
        let mut loads = TextureLoads::new(Box::new(SourceLoader::new()));
        loads.start(TextureId(4), &url);

        let mut done = wait_for(&mut loads);
        let completion = done.pop().unwrap();
        assert_eq!(completion.source, url);
        let image = completion.result.unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(&image.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_http_error_status() {
        let url = serve_once("404 Not Found", Vec::new());
        let mut loads = TextureLoads::new(Box::new(HttpImageLoader::new()));
        loads.start(TextureId(5), &url);
        let done = wait_for(&mut loads);
        assert!(matches!(done[0].result, Err(LoadError::Http(_))));
    }

    #[test]
    fn test_http_loader_rejects_other_schemes() {
        let mut loads = TextureLoads::new(Box::new(HttpImageLoader::new()));
        loads.start(TextureId(6), "ftp://example.com/a.png");
        let done = loads.drain();
        assert!(matches!(done[0].result, Err(LoadError::UnsupportedSource(_))));
    }

    #[test]
    fn test_source_loader_unknown_scheme() {
        let mut loads = TextureLoads::new(Box::new(SourceLoader::new()));
        loads.start(TextureId(7), "ftp://example.com/a.png");
        let done = loads.drain();
        assert!(matches!(done[0].result, Err(LoadError::UnsupportedSource(_))));
    }
}
