// SPDX-FileCopyrightText: 2025 2025 Contributors to the gst-amlhal project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime loading of the audio client library.

use std::{ffi::OsStr, sync::Arc};

use amlhal_sys::{AudioHwLoadInterfaceFn, AudioHwUnloadInterfaceFn};

use crate::Result;

/// Entry points resolved from `libaudio_client.so`.
///
/// The library stays loaded for as long as any clone of the
/// [`AudioClientApiHandle`] is alive, which includes every device opened
/// through it.
pub struct AudioClientApi {
    pub(crate) load_interface: AudioHwLoadInterfaceFn,
    pub(crate) unload_interface: AudioHwUnloadInterfaceFn,
    _library: libloading::Library,
}

/// Shared handle to a loaded client library.
pub type AudioClientApiHandle = Arc<AudioClientApi>;

/// Loads the client library and resolves the device load/unload functions.
///
/// # Errors
///
/// Returns [`crate::Error::LibLoading`] if the library cannot be opened or
/// does not export the expected symbols.
pub fn load_api(path: impl AsRef<OsStr>) -> Result<AudioClientApiHandle> {
    // SAFETY: loading runs the library's initialisers; the audio client has
    // no initialisation requirements beyond being on the loader path.
    let library = unsafe { libloading::Library::new(path.as_ref())? };

    let load_interface = unsafe {
        *library.get::<AudioHwLoadInterfaceFn>(amlhal_sys::AUDIO_HW_LOAD_INTERFACE_SYMBOL)?
    };
    let unload_interface = unsafe {
        *library.get::<AudioHwUnloadInterfaceFn>(amlhal_sys::AUDIO_HW_UNLOAD_INTERFACE_SYMBOL)?
    };

    tracing::debug!("Loaded audio client library {:?}", path.as_ref());

    Ok(Arc::new(AudioClientApi {
        load_interface,
        unload_interface,
        _library: library,
    }))
}
