//! 2D textures.
//!
//! A texture created from a URL shows a 2x2 magenta and black checker until
//! its image arrives. Arrived images are applied by
//! [`Renderer3D::poll_texture_loads`].

use std::fmt;

use justdraw_canvas::ImageData;
use justdraw_common::{OptionExt, Result};
use justdraw_gl::{constants, GlContext, GlObject};
use tracing::{debug, trace, warn};

use super::{TextureFilter, TextureId, TextureTarget, TextureWrap};
use crate::Renderer3D;

const PLACEHOLDER: [u8; 16] = [
    255, 0, 255, 255, //
    0, 0, 0, 255, //
    0, 0, 0, 255, //
    255, 0, 255, 255,
];

/// Where a texture's pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    Pixels(ImageData),
    /// Path or URL handed to the renderer's image loader.
    Url(String),
}

impl From<ImageData> for TextureSource {
    fn from(image: ImageData) -> Self {
        TextureSource::Pixels(image)
    }
}

impl From<&str> for TextureSource {
    fn from(url: &str) -> Self {
        TextureSource::Url(url.to_string())
    }
}

impl From<String> for TextureSource {
    fn from(url: String) -> Self {
        TextureSource::Url(url)
    }
}

/// Creation options of a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureOptions {
    pub source: TextureSource,
    pub target: TextureTarget,
    pub mipmap: bool,
    /// Filter between mipmap levels.
    pub mipmap_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    /// Level of detail the image is uploaded to.
    pub level: i32,
    /// Texture unit, `0` for `TEXTURE0`.
    pub slot: u32,
}

impl TextureOptions {
    pub fn new(source: impl Into<TextureSource>) -> Self {
        Self {
            source: source.into(),
            target: TextureTarget::Texture2D,
            mipmap: true,
            mipmap_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            level: 0,
            slot: 0,
        }
    }

    pub fn with_target(mut self, target: TextureTarget) -> Self {
        self.target = target;
        self
    }

    pub fn mipmap(mut self, mipmap: bool) -> Self {
        self.mipmap = mipmap;
        self
    }

    pub fn with_mipmap_filter(mut self, filter: TextureFilter) -> Self {
        self.mipmap_filter = filter;
        self
    }

    pub fn with_filters(mut self, min: TextureFilter, mag: TextureFilter) -> Self {
        self.min_filter = min;
        self.mag_filter = mag;
        self
    }

    pub fn with_wrap(mut self, wrap_s: TextureWrap, wrap_t: TextureWrap) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_slot(mut self, slot: u32) -> Self {
        self.slot = slot;
        self
    }
}

/// One-off overrides for [`Renderer3D::set_texture_parameters`]. Unset
/// fields fall back to the texture's own settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureParameters {
    pub mipmap: Option<bool>,
    pub mipmap_filter: Option<TextureFilter>,
    pub min_filter: Option<TextureFilter>,
    pub mag_filter: Option<TextureFilter>,
    pub wrap_s: Option<TextureWrap>,
    pub wrap_t: Option<TextureWrap>,
    pub power_of_two: Option<bool>,
}

type OnLoad = Box<dyn FnMut(&Texture)>;

/// A texture object and its sampling settings.
pub struct Texture {
    id: TextureId,
    handle: GlObject,
    target: TextureTarget,
    mipmap: bool,
    mipmap_filter: TextureFilter,
    min_filter: TextureFilter,
    mag_filter: TextureFilter,
    wrap_s: TextureWrap,
    wrap_t: TextureWrap,
    level: i32,
    slot: u32,
    width: u32,
    height: u32,
    power_of_two: bool,
    on_load: Option<OnLoad>,
}

impl Texture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn handle(&self) -> GlObject {
        self.handle
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_power_of_two(&self) -> bool {
        self.power_of_two
    }

    pub fn wrap(&self) -> (TextureWrap, TextureWrap) {
        (self.wrap_s, self.wrap_t)
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("mipmap", &self.mipmap)
            .field("min_filter", &self.min_filter)
            .field("mag_filter", &self.mag_filter)
            .field("wrap", &(self.wrap_s, self.wrap_t))
            .field("slot", &self.slot)
            .field("size", &(self.width, self.height))
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

impl<G: GlContext> Renderer3D<G> {
    pub fn texture(&self, id: TextureId) -> Result<&Texture> {
        self.textures.get(id.0).ok_or_unknown(TextureId::KIND, id.0)
    }

    fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture> {
        self.textures
            .get_mut(id.0)
            .ok_or_unknown(TextureId::KIND, id.0)
    }

    /// Create a texture. Pixel sources are uploaded right away; URL sources
    /// upload the placeholder and start loading in the background.
    pub fn create_texture(&mut self, options: TextureOptions) -> Result<TextureId> {
        let id = TextureId(self.textures.len());
        let handle = self.gl.create_texture();
        self.textures.push(Texture {
            id,
            handle,
            target: options.target,
            mipmap: options.mipmap,
            mipmap_filter: options.mipmap_filter,
            min_filter: options.min_filter,
            mag_filter: options.mag_filter,
            wrap_s: options.wrap_s,
            wrap_t: options.wrap_t,
            level: options.level,
            slot: options.slot,
            width: 0,
            height: 0,
            power_of_two: false,
            on_load: None,
        });
        debug!(texture = %id, slot = options.slot, "texture created");

        match options.source {
            TextureSource::Pixels(image) => {
                self.update_texture(id, &image)?;
                self.set_texture_parameters(id, TextureParameters::default())?;
            }
            TextureSource::Url(url) => {
                let placeholder = ImageData {
                    width: 2,
                    height: 2,
                    data: PLACEHOLDER.to_vec(),
                };
                self.update_texture(id, &placeholder)?;
                self.set_texture_parameters(
                    id,
                    TextureParameters {
                        mipmap: Some(false),
                        power_of_two: Some(true),
                        min_filter: Some(TextureFilter::Nearest),
                        mag_filter: Some(TextureFilter::Nearest),
                        wrap_s: Some(TextureWrap::ClampToEdge),
                        wrap_t: Some(TextureWrap::ClampToEdge),
                        ..TextureParameters::default()
                    },
                )?;
                self.load_texture(id, &url)?;
            }
        }
        Ok(id)
    }

    /// Start loading `url` into the texture. Every load is applied when it
    /// completes, in completion order.
    pub fn load_texture(&mut self, id: TextureId, url: &str) -> Result<()> {
        self.texture(id)?;
        debug!(texture = %id, url, "texture load started");
        self.loads.start(id, url);
        Ok(())
    }

    /// Callback run after a loaded image has been uploaded.
    pub fn set_texture_on_load(&mut self, id: TextureId, on_load: impl FnMut(&Texture) + 'static) -> Result<()> {
        self.texture_mut(id)?.on_load = Some(Box::new(on_load));
        Ok(())
    }

    /// Activate `TEXTURE0 + slot` and bind the texture there, unless this
    /// texture is already the bound one on that slot, or with `force`.
    pub fn bind_texture(&mut self, id: TextureId, slot: u32, force: bool) -> Result<()> {
        let texture = self.texture(id)?;
        let (target, handle) = (texture.target.gl_enum(), texture.handle);
        if self.cache.texture.acquire((id, slot), force) {
            trace!(texture = %id, slot, "bind texture");
            self.gl.active_texture(constants::TEXTURE0 + slot);
            self.gl.bind_texture(target, Some(handle));
        }
        Ok(())
    }

    /// Upload `image` as RGBA bytes at the texture's level.
    pub fn update_texture(&mut self, id: TextureId, image: &ImageData) -> Result<()> {
        let slot = self.texture(id)?.slot;
        self.bind_texture(id, slot, false)?;

        let texture = self.texture_mut(id)?;
        texture.width = image.width;
        texture.height = image.height;
        texture.power_of_two = image.is_power_of_two();
        let (target, level) = (texture.target.gl_enum(), texture.level);

        trace!(texture = %id, width = image.width, height = image.height, "tex image");
        self.gl.tex_image_2d(
            target,
            level,
            constants::RGBA as i32,
            image.width as i32,
            image.height as i32,
            0,
            constants::RGBA,
            constants::UNSIGNED_BYTE,
            Some(&image.data),
        );
        Ok(())
    }

    /// Set filtering and wrapping, generating mipmaps when they are enabled
    /// and the image is power-of-two sized.
    pub fn set_texture_parameters(&mut self, id: TextureId, overrides: TextureParameters) -> Result<()> {
        let slot = self.texture(id)?.slot;
        self.bind_texture(id, slot, false)?;

        let texture = self.texture_mut(id)?;
        let mipmap = overrides.mipmap.unwrap_or(texture.mipmap);
        let mipmap_filter = overrides.mipmap_filter.unwrap_or(texture.mipmap_filter);
        let min_filter = overrides.min_filter.unwrap_or(texture.min_filter);
        let mag_filter = overrides.mag_filter.unwrap_or(texture.mag_filter);
        let mut wrap_s = overrides.wrap_s.unwrap_or(texture.wrap_s);
        let mut wrap_t = overrides.wrap_t.unwrap_or(texture.wrap_t);
        let power_of_two = overrides.power_of_two.unwrap_or(texture.power_of_two);

        let (min, mag) = if mipmap && power_of_two {
            (mipmap_filter.mipmapped(min_filter), mag_filter.gl_enum())
        } else {
            (min_filter.gl_enum(), mag_filter.gl_enum())
        };

        // Only power-of-two textures may repeat
        if !power_of_two {
            texture.wrap_s = TextureWrap::ClampToEdge;
            texture.wrap_t = TextureWrap::ClampToEdge;
            wrap_s = TextureWrap::ClampToEdge;
            wrap_t = TextureWrap::ClampToEdge;
        }
        let target = texture.target.gl_enum();

        self.gl.tex_parameteri(target, constants::TEXTURE_MIN_FILTER, min as i32);
        self.gl.tex_parameteri(target, constants::TEXTURE_MAG_FILTER, mag as i32);
        self.gl
            .tex_parameteri(target, constants::TEXTURE_WRAP_S, wrap_s.gl_enum() as i32);
        self.gl
            .tex_parameteri(target, constants::TEXTURE_WRAP_T, wrap_t.gl_enum() as i32);

        if mipmap && power_of_two {
            self.gl.generate_mipmap(target);
        }
        Ok(())
    }

    /// Apply the image loads that completed since the last poll and return
    /// how many there were. Failed loads are logged; the texture keeps its
    /// current image.
    pub fn poll_texture_loads(&mut self) -> Result<usize> {
        let completions = self.loads.drain();
        let count = completions.len();

        for completion in completions {
            let id = completion.texture;
            let image = match completion.result {
                Ok(image) => image,
                Err(e) => {
                    warn!(texture = %id, source = %completion.source, error = %e, "texture load failed");
                    continue;
                }
            };

            self.update_texture(id, &image)?;
            self.set_texture_parameters(id, TextureParameters::default())?;
            debug!(texture = %id, source = %completion.source, "texture loaded");

            if let Some(mut on_load) = self.texture_mut(id)?.on_load.take() {
                on_load(self.texture(id)?);
                self.texture_mut(id)?.on_load = Some(on_load);
            }
        }
        Ok(count)
    }

    /// Loads started but not yet received by [`poll_texture_loads`](Self::poll_texture_loads).
    pub fn pending_texture_loads(&self) -> usize {
        self.loads.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ImageLoader, LoadError, LoadSink};
    use crate::webgl::program::tests::renderer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pixels(width: u32, height: u32) -> ImageData {
        ImageData::new(width, height)
    }

    /// Holds sinks until the test completes them.
    #[derive(Clone, Default)]
    struct Deferred(Rc<RefCell<Vec<LoadSink>>>);

    impl ImageLoader for Deferred {
        fn load(&self, sink: LoadSink) {
            self.0.borrow_mut().push(sink);
        }
    }

    impl Deferred {
        fn complete(&self, result: std::result::Result<ImageData, LoadError>) {
            let sink = self.0.borrow_mut().remove(0);
            sink.complete(result);
        }
    }

    #[test]
    fn test_pixels_upload() {
        let mut r = renderer();
        let id = r.create_texture(TextureOptions::new(pixels(4, 4))).unwrap();

        let texture = r.texture(id).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 4));
        assert!(texture.is_power_of_two());

        let data = r.gl().texture(texture.handle()).unwrap();
        assert_eq!((data.width, data.height), (4, 4));
        assert_eq!(data.min_filter, constants::LINEAR_MIPMAP_LINEAR);
        assert_eq!(data.mag_filter, constants::LINEAR);
        assert!(data.has_mipmaps);
    }

    #[test]
    fn test_npot_clamps_and_skips_mipmaps() {
        let mut r = renderer();
        let id = r
            .create_texture(
                TextureOptions::new(pixels(3, 5)).with_wrap(TextureWrap::Repeat, TextureWrap::MirroredRepeat),
            )
            .unwrap();

        let texture = r.texture(id).unwrap();
        assert_eq!(texture.wrap(), (TextureWrap::ClampToEdge, TextureWrap::ClampToEdge));
        let data = r.gl().texture(texture.handle()).unwrap();
        assert_eq!(data.min_filter, constants::LINEAR);
        assert_eq!((data.wrap_s, data.wrap_t), (constants::CLAMP_TO_EDGE, constants::CLAMP_TO_EDGE));
        assert!(!data.has_mipmaps);
        assert_eq!(r.gl().stats().generate_mipmap, 0);
        assert_eq!(r.gl_mut().get_error(), constants::NO_ERROR);
    }

    #[test]
    fn test_filters_and_overrides() {
        let mut r = renderer();
        let id = r
            .create_texture(
                TextureOptions::new(pixels(2, 2))
                    .with_mipmap_filter(TextureFilter::Nearest)
                    .with_filters(TextureFilter::Nearest, TextureFilter::Nearest)
                    .with_wrap(TextureWrap::Repeat, TextureWrap::Repeat),
            )
            .unwrap();
        let handle = r.texture(id).unwrap().handle();
        let data = r.gl().texture(handle).unwrap();
        assert_eq!(data.min_filter, constants::NEAREST_MIPMAP_NEAREST);
        assert_eq!(data.mag_filter, constants::NEAREST);
        assert_eq!(data.wrap_s, constants::REPEAT);

        r.set_texture_parameters(
            id,
            TextureParameters {
                mipmap: Some(false),
                mag_filter: Some(TextureFilter::Linear),
                ..TextureParameters::default()
            },
        )
        .unwrap();
        let data = r.gl().texture(handle).unwrap();
        assert_eq!(data.min_filter, constants::NEAREST);
        assert_eq!(data.mag_filter, constants::LINEAR);
    }

    #[test]
    fn test_slot_binding() {
        let mut r = renderer();
        let id = r.create_texture(TextureOptions::new(pixels(1, 1)).with_slot(3)).unwrap();
        let handle = r.texture(id).unwrap().handle();
        assert_eq!(r.gl().bound_texture(3), Some(handle));
        assert_eq!(r.gl().bound_texture(0), None);
        assert_eq!(r.cache().texture.current(), Some((id, 3)));
    }

    #[test]
    fn test_bind_cached_per_slot() {
        let mut r = renderer();
        let id = r.create_texture(TextureOptions::new(pixels(1, 1))).unwrap();
        r.gl_mut().reset_stats();

        r.bind_texture(id, 0, false).unwrap();
        r.bind_texture(id, 0, false).unwrap();
        r.bind_texture(id, 1, false).unwrap();
        r.bind_texture(id, 1, true).unwrap();
        assert_eq!(r.gl().stats().bind_texture, 3);
        assert_eq!(r.gl().stats().active_texture, 3);
        assert_eq!(r.gl().state().active_texture, 1);
    }

    #[test]
    fn test_url_placeholder_then_load() {
        let loader = Deferred::default();
        let mut r = renderer().with_loader(loader.clone());
        let id = r.create_texture(TextureOptions::new("img/grass.png")).unwrap();

        let handle = r.texture(id).unwrap().handle();
        let data = r.gl().texture(handle).unwrap();
        assert_eq!(&data.data[..], &PLACEHOLDER[..]);
        assert_eq!(data.min_filter, constants::NEAREST);
        assert!(!data.has_mipmaps);
        assert_eq!(r.pending_texture_loads(), 1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        r.set_texture_on_load(id, move |t| sink.borrow_mut().push((t.width(), t.height())))
            .unwrap();

        assert_eq!(r.poll_texture_loads().unwrap(), 0);
        loader.complete(Ok(pixels(8, 8)));
        assert_eq!(r.poll_texture_loads().unwrap(), 1);
        assert_eq!(r.pending_texture_loads(), 0);

        let data = r.gl().texture(handle).unwrap();
        assert_eq!((data.width, data.height), (8, 8));
        assert_eq!(data.min_filter, constants::LINEAR_MIPMAP_LINEAR);
        assert!(data.has_mipmaps);
        assert_eq!(*seen.borrow(), vec![(8, 8)]);

        // the callback stays registered for later loads
        r.load_texture(id, "img/grass@2x.png").unwrap();
        loader.complete(Ok(pixels(16, 16)));
        r.poll_texture_loads().unwrap();
        assert_eq!(*seen.borrow(), vec![(8, 8), (16, 16)]);
    }

    #[test]
    fn test_failed_load_keeps_placeholder() {
        let loader = Deferred::default();
        let mut r = renderer().with_loader(loader.clone());
        let id = r.create_texture(TextureOptions::new("missing.png")).unwrap();

        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);
        r.set_texture_on_load(id, move |_| *flag.borrow_mut() = true).unwrap();

        loader.complete(Err(LoadError::UnsupportedSource("missing.png".into())));
        assert_eq!(r.poll_texture_loads().unwrap(), 1);

        let texture = r.texture(id).unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));
        assert!(!*called.borrow());
    }

    #[test]
    fn test_http_source_loads_by_default() {
        use crate::loader::tests::{png_bytes, serve_once};
        use std::time::{Duration, Instant};

        let url = serve_once("200 OK", png_bytes(4, 8));
        let mut r = renderer();
        let id = r.create_texture(TextureOptions::new(url)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut polled = 0;
        while polled == 0 && Instant::now() < deadline {
            polled = r.poll_texture_loads().unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(polled, 1);

        let texture = r.texture(id).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 8));
        let data = r.gl().texture(texture.handle()).unwrap();
        assert_eq!(&data.data[..4], &[10, 20, 30, 255]);
        assert!(data.has_mipmaps);
    }

    #[test]
    fn test_unknown_texture() {
        let mut r = renderer();
        assert!(r.bind_texture(TextureId(2), 0, false).is_err());
        assert!(r.load_texture(TextureId(2), "a.png").is_err());
    }
}
