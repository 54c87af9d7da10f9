//! Textures: sized, formatted byte payloads referenced by materials and
//! image-based lights

/// Pixel format of a texture payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgba16,
    Rgba32,
}

impl TextureFormat {
    /// Bytes per texel.
    pub fn texel_size(&self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba16 => 8,
            TextureFormat::Rgba32 => 16,
        }
    }
}

/// An image with a contiguous byte payload
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
    dirty: bool,
}

impl Texture {
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * format.texel_size()
        );
        Self {
            width,
            height,
            format,
            data,
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}
