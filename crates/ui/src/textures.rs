use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use anyhow::Result;

enum Slot {
    Loading,
    Decoded(egui::ColorImage),
    Ready(egui::TextureHandle),
    Failed,
}

/// Decoded slide images, uploaded to the GPU on first use.
///
/// Decoding never happens on the UI thread. On native hosts this type is
/// also the banner's [`ImageLoader`](conf_hero_core::ImageLoader): each
/// preload reads and decodes its image on a worker thread and leaves the
/// result here for the renderer. On the web the bytes are fetched
/// asynchronously after the browser has cached them.
#[derive(Clone)]
pub struct SlideTextures {
    slots: Rc<RefCell<HashMap<String, Slot>>>,
    #[cfg(not(target_arch = "wasm32"))]
    files: conf_hero_core::native::FsImageLoader,
    #[cfg(not(target_arch = "wasm32"))]
    spawner: futures::executor::LocalSpawner,
}

pub fn decode(bytes: &[u8]) -> Result<egui::ColorImage> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

impl SlideTextures {
    /// Images resolve against `root`; loads the renderer asks for before
    /// any preload run on `spawner`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(
        root: impl Into<std::path::PathBuf>,
        spawner: futures::executor::LocalSpawner,
    ) -> Self {
        Self {
            slots: Rc::default(),
            files: conf_hero_core::native::FsImageLoader::new(root),
            spawner,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {
            slots: Rc::default(),
        }
    }

    /// Texture for `uri`, starting the load on first request.
    pub fn texture(&self, ctx: &egui::Context, uri: &str) -> Option<egui::TextureHandle> {
        let mut slots = self.slots.borrow_mut();
        if let Some(Slot::Ready(handle)) = slots.get(uri) {
            return Some(handle.clone());
        }
        match slots.remove(uri) {
            Some(Slot::Decoded(image)) => {
                let handle = ctx.load_texture(uri, image, egui::TextureOptions::LINEAR);
                slots.insert(uri.to_owned(), Slot::Ready(handle.clone()));
                Some(handle)
            }
            Some(slot) => {
                slots.insert(uri.to_owned(), slot);
                None
            }
            None => {
                slots.insert(uri.to_owned(), Slot::Loading);
                drop(slots);
                self.start(ctx, uri);
                None
            }
        }
    }

    fn store<E: Display>(&self, uri: &str, decoded: Result<egui::ColorImage, E>) {
        let slot = match decoded {
            Ok(image) => Slot::Decoded(image),
            Err(err) => {
                log::warn!("could not decode slide {uri}: {err}");
                Slot::Failed
            }
        };
        self.slots.borrow_mut().insert(uri.to_owned(), slot);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start(&self, ctx: &egui::Context, uri: &str) {
        use conf_hero_core::ImageLoader;
        use futures::task::LocalSpawnExt;

        let load = self.load(uri);
        let ctx = ctx.clone();
        let spawned = self.spawner.spawn_local(async move {
            let _ = load.await;
            ctx.request_repaint();
        });
        if let Err(err) = spawned {
            self.store(uri, Err::<egui::ColorImage, _>(err));
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn start(&self, ctx: &egui::Context, uri: &str) {
        let textures = self.clone();
        let ctx = ctx.clone();
        let uri = uri.to_owned();
        wasm_bindgen_futures::spawn_local(async move {
            let decoded = crate::web::fetch_bytes(&uri, false)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|bytes| decode(&bytes));
            textures.store(&uri, decoded);
            ctx.request_repaint();
        });
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn decode_file(path: &std::path::Path) -> Result<egui::ColorImage, conf_hero_core::AssetError> {
    use conf_hero_core::AssetError;
    use conf_hero_core::native::FsImageLoader;

    let bytes = FsImageLoader::read_bytes(path)?;
    decode(&bytes).map_err(|e| AssetError::Rejected(e.to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
impl conf_hero_core::ImageLoader for SlideTextures {
    fn load(
        &self,
        uri: &str,
    ) -> futures::future::LocalBoxFuture<'static, Result<(), conf_hero_core::AssetError>> {
        use conf_hero_core::AssetError;
        use conf_hero_core::native::off_thread;
        use futures::FutureExt;

        if matches!(
            self.slots.borrow().get(uri),
            Some(Slot::Decoded(_) | Slot::Ready(_))
        ) {
            return futures::future::ready(Ok(())).boxed_local();
        }
        self.slots.borrow_mut().insert(uri.to_owned(), Slot::Loading);

        let path = self.files.resolve(uri);
        let textures = self.clone();
        let uri = uri.to_owned();
        off_thread("conf-hero-decode", move || decode_file(&path))
            .map(move |outcome| {
                let outcome = outcome
                    .unwrap_or_else(|| Err(AssetError::Io("decode worker stopped".into())));
                let settled = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
                textures.store(&uri, outcome);
                settled
            })
            .boxed_local()
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for SlideTextures {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png() {
        let decoded = decode(&png()).unwrap();
        assert_eq!(decoded.size, [3, 2]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(b"not an image").is_err());
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod native {
        use super::*;
        use conf_hero_core::{AssetError, ImageLoader};
        use futures::executor::LocalPool;

        fn site(name: &str) -> std::path::PathBuf {
            let root = std::env::temp_dir().join(name);
            std::fs::create_dir_all(root.join("heroImages")).unwrap();
            std::fs::write(root.join("heroImages/hero1.png"), png()).unwrap();
            root
        }

        #[test]
        fn preload_leaves_a_decoded_image_for_the_renderer() {
            let mut pool = LocalPool::new();
            let textures = SlideTextures::new(site("conf-hero-textures-preload"), pool.spawner());
            let ctx = egui::Context::default();

            assert_eq!(pool.run_until(textures.load("/heroImages/hero1.png")), Ok(()));
            assert!(matches!(
                textures.slots.borrow().get("/heroImages/hero1.png"),
                Some(Slot::Decoded(_))
            ));
            let handle = textures.texture(&ctx, "/heroImages/hero1.png").unwrap();
            assert_eq!(handle.size(), [3, 2]);
        }

        #[test]
        fn missing_file_fails_the_preload() {
            let mut pool = LocalPool::new();
            let textures = SlideTextures::new(site("conf-hero-textures-missing"), pool.spawner());
            let ctx = egui::Context::default();

            assert_eq!(
                pool.run_until(textures.load("/heroImages/nope.png")),
                Err(AssetError::NotFound)
            );
            assert!(textures.texture(&ctx, "/heroImages/nope.png").is_none());
            assert!(matches!(
                textures.slots.borrow().get("/heroImages/nope.png"),
                Some(Slot::Failed)
            ));
        }

        #[test]
        fn unpreloaded_texture_decodes_in_the_background() {
            let mut pool = LocalPool::new();
            let textures = SlideTextures::new(site("conf-hero-textures-lazy"), pool.spawner());
            let ctx = egui::Context::default();

            assert!(textures.texture(&ctx, "/heroImages/hero1.png").is_none());
            assert!(matches!(
                textures.slots.borrow().get("/heroImages/hero1.png"),
                Some(Slot::Loading)
            ));
            pool.run();
            assert!(textures.texture(&ctx, "/heroImages/hero1.png").is_some());
        }
    }
}
