//! Conversion between packed pixel buffers and RGBA texels.

use crate::block::Texel;
use crate::error::CodecError;
use half::f16;

/// Storage of one pixel component.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ComponentType {
    /// 8-bit UNORM.
    Unorm8,
    /// IEEE 754 half precision float.
    Half,
    /// IEEE 754 single precision float.
    Float,
}

impl ComponentType {
    pub(crate) fn from_size(component_size: usize) -> Result<Self, CodecError> {
        match component_size {
            1 => Ok(ComponentType::Unorm8),
            2 => Ok(ComponentType::Half),
            4 => Ok(ComponentType::Float),
            _ => Err(CodecError::UnsupportedComponentSize),
        }
    }

    pub(crate) const fn size(self) -> usize {
        match self {
            ComponentType::Unorm8 => 1,
            ComponentType::Half => 2,
            ComponentType::Float => 4,
        }
    }
}

/// Layout of pixels in a packed buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PixelLayout {
    pub(crate) num_components: usize,
    pub(crate) component: ComponentType,
}

impl PixelLayout {
    pub(crate) fn new(num_components: usize, component_size: usize) -> Result<Self, CodecError> {
        if !(1..=4).contains(&num_components) {
            return Err(CodecError::UnsupportedComponentCount);
        }
        Ok(Self {
            num_components,
            component: ComponentType::from_size(component_size)?,
        })
    }

    pub(crate) const fn bytes_per_pixel(&self) -> usize {
        self.num_components * self.component.size()
    }

    /// Size of a `width` x `height` image, or [`None`] on overflow.
    pub(crate) fn image_size(&self, width: usize, height: usize) -> Option<usize> {
        width.checked_mul(height)?.checked_mul(self.bytes_per_pixel())
    }

    /// Reads the pixel at `offset` as RGBA in `[0, 1]`.
    ///
    /// L expands to (L, L, L, 1), LA to (L, L, L, A) and RGB to (R, G, B, 1).
    #[inline]
    pub(crate) fn read(&self, data: &[u8], offset: usize) -> [f32; 4] {
        let mut channels = [0f32, 0.0, 0.0, 1.0];
        for (index, channel) in channels.iter_mut().take(self.num_components).enumerate() {
            *channel = self.read_component(data, offset + index * self.component.size());
        }

        match self.num_components {
            1 => [channels[0], channels[0], channels[0], 1.0],
            2 => [channels[0], channels[0], channels[0], channels[1]],
            _ => channels,
        }
    }

    #[inline]
    fn read_component(&self, data: &[u8], offset: usize) -> f32 {
        let value = match self.component {
            ComponentType::Unorm8 => data[offset] as f32 / 255.0,
            ComponentType::Half => {
                f16::from_ne_bytes([data[offset], data[offset + 1]]).to_f32()
            }
            ComponentType::Float => f32::from_ne_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]),
        };

        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }

    /// Writes a decoded texel at `offset`, keeping only the stored components.
    #[inline]
    pub(crate) fn write(&self, data: &mut [u8], offset: usize, texel: &Texel) {
        let channels: &[usize] = match self.num_components {
            1 => &[0],
            2 => &[0, 3],
            3 => &[0, 1, 2],
            _ => &[0, 1, 2, 3],
        };

        let size = self.component.size();
        for (index, &channel) in channels.iter().enumerate() {
            let target = &mut data[offset + index * size..offset + (index + 1) * size];
            let value = texel[channel];
            match self.component {
                ComponentType::Unorm8 => target[0] = (value >> 8) as u8,
                ComponentType::Half => {
                    target.copy_from_slice(&f16::from_f32(value as f32 / 65535.0).to_ne_bytes())
                }
                ComponentType::Float => {
                    target.copy_from_slice(&(value as f32 / 65535.0).to_ne_bytes())
                }
            }
        }
    }
}
