//! Read-only image asset store in internal flash.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage` crate.
//! The asset region is provisioned at flashing time as a key-value map:
//! one item per [`Asset`], keyed by [`Asset::key`], holding a raw 1-bpp
//! bitmap (see [`crate::display::Bitmap`]).
//!
//! Storage layout:
//!   - Pages `ASSET_FLASH_PAGE_START .. +ASSET_FLASH_PAGE_COUNT`.
//!   - Everything is read once at startup into the [`ImageCache`]; the
//!     firmware never writes the region.

use defmt::{error, info, warn};
use embedded_storage_async::nor_flash::NorFlash;

use crate::config::{ASSET_FLASH_PAGE_COUNT, ASSET_FLASH_PAGE_START, MAX_ASSET_BYTES};
use crate::display::cache::ImageCache;
use crate::display::Asset;
use crate::error::Error;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of the asset region.
const ASSET_START: u32 = ASSET_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of the asset region.
const ASSET_END: u32 = (ASSET_FLASH_PAGE_START + ASSET_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Item header overhead (key + map bookkeeping) on top of the asset bytes.
const ITEM_OVERHEAD: usize = 16;

/// Read one asset into `buf`, returning its bytes.
pub async fn fetch_asset<'b>(
    flash: &mut impl NorFlash,
    asset: Asset,
    buf: &'b mut [u8],
) -> Result<&'b [u8], Error> {
    let key = asset.key().ok_or(Error::AssetMalformed)?;
    match sequential_storage::map::fetch_item::<u8, &[u8], _>(
        flash,
        ASSET_START..ASSET_END,
        &mut sequential_storage::cache::NoCache::new(),
        buf,
        &key,
    )
    .await
    {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(Error::AssetMissing),
        Err(e) => {
            error!("Flash read error: {:?}", defmt::Debug2Format(&e));
            Err(Error::Storage)
        }
    }
}

/// Fill the cache with every provisioned asset. Returns the number loaded.
///
/// A missing or oversized asset leaves its slot empty; drawing it later is
/// a no-op.
pub async fn preload_assets(flash: &mut impl NorFlash, cache: &mut ImageCache) -> usize {
    let mut buf = [0u8; MAX_ASSET_BYTES + ITEM_OVERHEAD];

    for asset in Asset::all() {
        let result = match fetch_asset(flash, asset, &mut buf).await {
            Ok(bytes) => cache.insert(asset, bytes),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("asset {} not loaded: {:?}", asset.path(), e);
        }
    }

    let loaded = cache.loaded();
    info!("Loaded {}/{} image assets from flash", loaded, Asset::COUNT);
    loaded
}
