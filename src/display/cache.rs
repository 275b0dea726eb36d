//! In-RAM image cache, filled once from flash at startup.
//!
//! After preload the cache is frozen behind a `&'static` reference and read
//! without locking. A slot that failed to load stays empty and every draw
//! that needs it becomes a no-op.

use heapless::Vec;

use super::{Asset, Bitmap};
use crate::config::MAX_ASSET_BYTES;
use crate::error::Error;

pub struct ImageCache {
    slots: [Option<Vec<u8, MAX_ASSET_BYTES>>; Asset::COUNT],
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Copy an asset into its slot, replacing any previous content.
    pub fn insert(&mut self, asset: Asset, bytes: &[u8]) -> Result<(), Error> {
        let slot = asset
            .slot()
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(Error::AssetMalformed)?;
        let data = Vec::from_slice(bytes).map_err(|_| Error::AssetTooLarge)?;
        *slot = Some(data);
        Ok(())
    }

    /// Raw bytes of a loaded asset.
    pub fn get(&self, asset: Asset) -> Option<&[u8]> {
        self.slots.get(asset.slot()?)?.as_deref()
    }

    /// Decoded bitmap of a loaded asset; malformed entries read as missing.
    pub fn bitmap(&self, asset: Asset) -> Option<Bitmap<'_>> {
        Bitmap::parse(self.get(asset)?).ok()
    }

    /// Number of populated slots.
    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_misses() {
        let cache = ImageCache::new();
        for asset in Asset::all() {
            assert!(cache.get(asset).is_none());
        }
        assert_eq!(cache.loaded(), 0);
    }

    #[test]
    fn insert_and_read_back() {
        let mut cache = ImageCache::new();
        let icon = [8, 0, 1, 0, 0b1010_1010];
        cache.insert(Asset::IconCaps, &icon).unwrap();
        assert_eq!(cache.get(Asset::IconCaps), Some(&icon[..]));
        assert!(cache.get(Asset::IconConnected).is_none());
        let bitmap = cache.bitmap(Asset::IconCaps).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (8, 1));
        assert_eq!(cache.loaded(), 1);
    }

    #[test]
    fn oversized_asset_is_rejected() {
        let mut cache = ImageCache::new();
        let big = [0u8; MAX_ASSET_BYTES + 1];
        assert_eq!(cache.insert(Asset::Bongo(0), &big), Err(Error::AssetTooLarge));
        assert!(cache.get(Asset::Bongo(0)).is_none());
    }

    #[test]
    fn out_of_range_frame_is_rejected() {
        let mut cache = ImageCache::new();
        let frame = [8, 0, 1, 0, 0xFF];
        assert_eq!(cache.insert(Asset::Bongo(8), &frame), Err(Error::AssetMalformed));
        assert_eq!(cache.insert(Asset::Bongo(11), &frame), Err(Error::AssetMalformed));
        assert!(cache.get(Asset::IconConnected).is_none());
        assert!(cache.get(Asset::Bongo(11)).is_none());
        assert_eq!(cache.loaded(), 0);
    }

    #[test]
    fn malformed_asset_has_no_bitmap() {
        let mut cache = ImageCache::new();
        cache.insert(Asset::Bongo(3), &[0xFF]).unwrap();
        assert!(cache.get(Asset::Bongo(3)).is_some());
        assert!(cache.bitmap(Asset::Bongo(3)).is_none());
    }
}
