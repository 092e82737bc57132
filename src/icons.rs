//! Icon resolution for launcher tiles.
//!
//! Lookups never block the UI thread. A miss is queued on the
//! [`IconLoader`] worker and the tile shows its placeholder letter until the
//! result is drained back through [`IconCache::accept`]. Failures are quiet:
//! a key that resolves to nothing just keeps its placeholder.

use crate::events::{IconRequest, IconResult};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

const CACHE_MAGIC: &[u8; 4] = b"FGI1";

/// Straight-alpha RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl IconImage {
    pub fn from_rgba(width: usize, height: usize, rgba: Vec<u8>) -> Option<Self> {
        (rgba.len() == width.checked_mul(height)?.checked_mul(4)?).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn transparent(width: usize, height: usize) -> Self {
        Self::solid(width, height, [0, 0, 0, 0])
    }

    pub fn solid(width: usize, height: usize, color: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    /// Nearest-neighbour resample to a `side` x `side` square.
    pub fn resize_to_square(&self, side: usize) -> IconImage {
        if self.width == side && self.height == side {
            return self.clone();
        }
        let mut out = vec![0u8; side * side * 4];
        if self.width == 0 || self.height == 0 {
            return IconImage {
                width: side,
                height: side,
                rgba: out,
            };
        }
        for y in 0..side {
            let sy = y * self.height / side;
            for x in 0..side {
                let sx = x * self.width / side;
                let si = (sy * self.width + sx) * 4;
                let di = (y * side + x) * 4;
                out[di..di + 4].copy_from_slice(&self.rgba[si..si + 4]);
            }
        }
        IconImage {
            width: side,
            height: side,
            rgba: out,
        }
    }

    /// Copies `src` onto `self` with its top-left at `(ox, oy)`, clipping at the edges.
    pub fn blit(&mut self, src: &IconImage, ox: usize, oy: usize) {
        for y in 0..src.height {
            let dy = oy + y;
            if dy >= self.height {
                break;
            }
            for x in 0..src.width {
                let dx = ox + x;
                if dx >= self.width {
                    break;
                }
                let si = (y * src.width + x) * 4;
                let di = (dy * self.width + dx) * 4;
                self.rgba[di..di + 4].copy_from_slice(&src.rgba[si..si + 4]);
            }
        }
    }
}

/// Resolves an icon key (path, folder or URL) to pixels.
pub trait IconProvider {
    fn resolve(&self, key: &str, name_hint: Option<&str>) -> Option<IconImage>;
}

impl<F> IconProvider for F
where
    F: Fn(&str, Option<&str>) -> Option<IconImage>,
{
    fn resolve(&self, key: &str, name_hint: Option<&str>) -> Option<IconImage> {
        self(key, name_hint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconLookup<'a> {
    Ready(&'a IconImage),
    /// Requested, result not back yet.
    Pending,
    /// Unknown or unresolvable; draw the name's first letter.
    Placeholder,
}

/// Per-window memo of resolved icons plus the set of keys still in flight.
#[derive(Debug, Default)]
pub struct IconCache {
    resolved: HashMap<String, Option<IconImage>>,
    in_flight: HashSet<String>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &str) -> IconLookup<'_> {
        match self.resolved.get(key) {
            Some(Some(image)) => IconLookup::Ready(image),
            Some(None) => IconLookup::Placeholder,
            None if self.in_flight.contains(key) => IconLookup::Pending,
            None => IconLookup::Placeholder,
        }
    }

    pub fn get(&self, key: &str) -> Option<&IconImage> {
        self.resolved.get(key).and_then(Option::as_ref)
    }

    /// Marks `key` as in flight and returns `true` when a fetch should start.
    /// Keys already resolved or already in flight return `false`.
    pub fn begin_fetch(&mut self, key: &str) -> bool {
        if self.resolved.contains_key(key) || self.in_flight.contains(key) {
            return false;
        }
        self.in_flight.insert(key.to_string());
        true
    }

    /// Stores a worker result and reports whether tiles using the key need a
    /// redraw. A later image replaces an earlier one; an empty result never
    /// replaces an image that is already cached.
    pub fn accept(&mut self, result: IconResult) -> bool {
        self.in_flight.remove(&result.key);
        let has_image = matches!(self.resolved.get(&result.key), Some(Some(_)));
        match result.image {
            None if has_image => false,
            image => {
                let changed = image.is_some();
                self.resolved.insert(result.key, image);
                changed
            }
        }
    }

    pub fn invalidate(&mut self, key: &str) {
        self.resolved.remove(key);
        self.in_flight.remove(key);
    }

    #[cfg(test)]
    pub(crate) fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// Background icon worker. Requests go in over one channel, results come back
/// over another and are drained on the UI thread.
pub struct IconLoader {
    req_tx: Sender<IconRequest>,
    result_rx: Receiver<IconResult>,
}

impl IconLoader {
    /// Starts the worker thread. `notify` runs after every result is queued,
    /// typically to wake the UI event loop.
    pub fn spawn<P, N>(provider: P, notify: N) -> Self
    where
        P: IconProvider + Send + 'static,
        N: Fn() + Send + 'static,
    {
        let (req_tx, req_rx) = unbounded::<IconRequest>();
        let (result_tx, result_rx) = unbounded::<IconResult>();

        thread::spawn(move || {
            #[cfg(windows)]
            let _com = shell::ComGuard::init();
            while let Ok(req) = req_rx.recv() {
                let side = req.size.clamp(16, 256) as usize;
                let image = provider
                    .resolve(&req.key, req.name_hint.as_deref())
                    .map(|img| img.resize_to_square(side));
                if image.is_none() {
                    debug!("no icon for {}", req.key);
                }
                if result_tx
                    .send(IconResult {
                        key: req.key,
                        image,
                    })
                    .is_err()
                {
                    break;
                }
                notify();
            }
        });

        Self { req_tx, result_rx }
    }

    pub fn request(&self, request: IconRequest) -> bool {
        match self.req_tx.send(request) {
            Ok(()) => true,
            Err(err) => {
                warn!("icon worker is gone, dropping request for {}", err.0.key);
                false
            }
        }
    }

    pub fn drain(&self) -> Vec<IconResult> {
        let mut out = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => out.push(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("icon worker disconnected");
                    break;
                }
            }
        }
        out
    }
}

/// Wraps another provider with an on-disk RGBA cache under `cache_dir`.
pub struct DiskCachedProvider<P> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P> DiskCachedProvider<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }
}

impl<P: IconProvider> IconProvider for DiskCachedProvider<P> {
    fn resolve(&self, key: &str, name_hint: Option<&str>) -> Option<IconImage> {
        if let Some(img) = load_cached_icon_at(&self.cache_dir, key) {
            return Some(img);
        }
        let img = self.inner.resolve(key, name_hint)?;
        if let Err(err) = save_cached_icon_at(&self.cache_dir, key, &img) {
            debug!("icon cache write failed for {key}: {err}");
        }
        Some(img)
    }
}

/// Icons the platform shell can provide: files and folders on Windows.
/// URLs and other platforms resolve to nothing, leaving the placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellIconProvider;

impl IconProvider for ShellIconProvider {
    fn resolve(&self, key: &str, _name_hint: Option<&str>) -> Option<IconImage> {
        if is_url(key) {
            return None;
        }
        let path = Path::new(key);
        if !path.exists() {
            return None;
        }
        extract_shell_icon(path)
    }
}

pub fn is_url(key: &str) -> bool {
    let lower = key.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(windows)]
fn extract_shell_icon(path: &Path) -> Option<IconImage> {
    shell::extract_icon(path)
}

#[cfg(not(windows))]
fn extract_shell_icon(_path: &Path) -> Option<IconImage> {
    None
}

fn stable_hash64(input: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in input {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn icon_cache_path_at(cache_dir: &Path, key: &str) -> PathBuf {
    cache_dir.join(format!("{:016x}.rgba", stable_hash64(key.as_bytes())))
}

fn load_cached_icon_at(cache_dir: &Path, key: &str) -> Option<IconImage> {
    let mut file = std::fs::File::open(icon_cache_path_at(cache_dir, key)).ok()?;

    let mut header = [0u8; 16];
    file.read_exact(&mut header).ok()?;
    if &header[0..4] != CACHE_MAGIC {
        return None;
    }
    let width = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let height = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let len = u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize;
    if len != width.saturating_mul(height).saturating_mul(4) {
        return None;
    }

    let mut pixels = vec![0u8; len];
    file.read_exact(&mut pixels).ok()?;
    IconImage::from_rgba(width, height, pixels)
}

fn save_cached_icon_at(cache_dir: &Path, key: &str, image: &IconImage) -> std::io::Result<()> {
    std::fs::create_dir_all(cache_dir)?;
    let mut file = std::fs::File::create(icon_cache_path_at(cache_dir, key))?;

    let mut header = [0u8; 16];
    header[0..4].copy_from_slice(CACHE_MAGIC);
    header[4..8].copy_from_slice(&(image.width as u32).to_le_bytes());
    header[8..12].copy_from_slice(&(image.height as u32).to_le_bytes());
    header[12..16].copy_from_slice(&(image.rgba.len() as u32).to_le_bytes());
    file.write_all(&header)?;
    file.write_all(&image.rgba)
}

#[cfg(windows)]
mod shell {
    use super::IconImage;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use windows::Win32::Graphics::Gdi::{
        CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits, GetObjectW, BITMAP, BITMAPINFO,
        BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HGDIOBJ,
    };
    use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};
    use windows::Win32::UI::Shell::{SHGetFileInfoW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON};
    use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, ICONINFO};

    pub(super) struct ComGuard(bool);

    impl ComGuard {
        pub(super) fn init() -> Self {
            Self(unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_ok() })
        }
    }

    impl Drop for ComGuard {
        fn drop(&mut self) {
            if self.0 {
                unsafe { CoUninitialize() };
            }
        }
    }

    pub(super) fn extract_icon(path: &Path) -> Option<IconImage> {
        let path_wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let mut info = SHFILEINFOW::default();
            let found = SHGetFileInfoW(
                windows::core::PCWSTR(path_wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&mut info),
                std::mem::size_of::<SHFILEINFOW>() as u32,
                SHGFI_ICON | SHGFI_LARGEICON,
            );
            if found == 0 || info.hIcon.is_invalid() {
                return None;
            }
            let hicon = info.hIcon;

            let mut icon_info = ICONINFO::default();
            if GetIconInfo(hicon, &mut icon_info).is_err() {
                let _ = DestroyIcon(hicon);
                return None;
            }

            let mut bitmap: BITMAP = std::mem::zeroed();
            let got = GetObjectW(
                HGDIOBJ(icon_info.hbmColor.0),
                std::mem::size_of::<BITMAP>() as i32,
                Some(&mut bitmap as *mut _ as *mut _),
            );
            let pixels = if got == 0 {
                None
            } else {
                let width = bitmap.bmWidth.max(0) as usize;
                let height = bitmap.bmHeight.unsigned_abs() as usize;
                let hdc = CreateCompatibleDC(None);
                let mut bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: width as i32,
                        biHeight: -(height as i32),
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    },
                    ..Default::default()
                };
                let mut buf = vec![0u8; width * height * 4];
                let rows = GetDIBits(
                    hdc,
                    icon_info.hbmColor,
                    0,
                    height as u32,
                    Some(buf.as_mut_ptr() as *mut _),
                    &mut bmi,
                    DIB_RGB_COLORS,
                );
                let _ = DeleteDC(hdc);
                (rows != 0).then_some((width, height, buf))
            };

            let _ = DeleteObject(icon_info.hbmColor);
            let _ = DeleteObject(icon_info.hbmMask);
            let _ = DestroyIcon(hicon);

            let (width, height, mut buf) = pixels?;
            for px in buf.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            IconImage::from_rgba(width, height, buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::temp_dir;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn result(key: &str, image: Option<IconImage>) -> IconResult {
        IconResult {
            key: key.to_string(),
            image,
        }
    }

    #[test]
    fn duplicate_fetches_are_suppressed_while_in_flight() {
        let mut cache = IconCache::new();
        assert!(cache.begin_fetch("calc.exe"));
        assert!(!cache.begin_fetch("calc.exe"));
        assert_eq!(cache.lookup("calc.exe"), IconLookup::Pending);

        assert!(cache.accept(result("calc.exe", Some(IconImage::solid(2, 2, [1, 2, 3, 4])))));
        assert!(matches!(cache.lookup("calc.exe"), IconLookup::Ready(_)));
        assert!(!cache.begin_fetch("calc.exe"));
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[test]
    fn failed_resolution_falls_back_to_placeholder() {
        let mut cache = IconCache::new();
        cache.begin_fetch("https://example.com");
        assert!(!cache.accept(result("https://example.com", None)));
        assert_eq!(cache.lookup("https://example.com"), IconLookup::Placeholder);
    }

    #[test]
    fn empty_result_never_clobbers_a_cached_image() {
        let mut cache = IconCache::new();
        let img = IconImage::solid(2, 2, [9, 9, 9, 255]);
        cache.accept(result("k", Some(img.clone())));
        assert!(!cache.accept(result("k", None)));
        assert_eq!(cache.get("k"), Some(&img));

        let newer = IconImage::solid(2, 2, [1, 1, 1, 255]);
        assert!(cache.accept(result("k", Some(newer.clone()))));
        assert_eq!(cache.get("k"), Some(&newer));
    }

    #[test]
    fn disk_cache_roundtrip_50() {
        let base = temp_dir("icon_cache");
        for i in 0..50u32 {
            let key = format!(r"C:\fake\app_{i}.exe");
            let img = IconImage::solid(64, 64, [(i % 255) as u8, 0, 0, 255]);
            save_cached_icon_at(&base, &key, &img).unwrap();
            let loaded = load_cached_icon_at(&base, &key).expect("missing cached icon");
            assert_eq!(loaded, img);
        }
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn disk_cached_provider_only_asks_inner_once() {
        let base = temp_dir("icon_provider");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let inner = move |_key: &str, _hint: Option<&str>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(IconImage::solid(4, 4, [0, 255, 0, 255]))
        };
        let provider = DiskCachedProvider::new(inner, &base);
        assert!(provider.resolve("notepad.exe", None).is_some());
        assert!(provider.resolve("notepad.exe", None).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn loader_reports_results_off_thread() {
        let provider = |key: &str, _hint: Option<&str>| {
            (key == "a").then(|| IconImage::solid(8, 8, [1, 1, 1, 255]))
        };
        let loader = IconLoader::spawn(provider, || {});
        for key in ["a", "b"] {
            assert!(loader.request(IconRequest {
                key: key.to_string(),
                name_hint: None,
                size: 32,
            }));
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.len() < 2 && Instant::now() < deadline {
            results.extend(loader.drain());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(results.len(), 2);
        let a = results.iter().find(|r| r.key == "a").unwrap();
        assert_eq!(a.image.as_ref().map(|i| i.width), Some(32));
        assert!(results.iter().find(|r| r.key == "b").unwrap().image.is_none());
    }

    #[test]
    fn urls_are_left_to_the_placeholder() {
        assert!(is_url("https://docs.rs"));
        assert!(ShellIconProvider.resolve("https://docs.rs", None).is_none());
        assert!(ShellIconProvider
            .resolve("/definitely/not/here.exe", None)
            .is_none());
    }
}
