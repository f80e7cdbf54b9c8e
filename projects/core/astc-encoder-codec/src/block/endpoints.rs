//! Direct LDR colour endpoint modes.

use super::BlockError;

/// An RGBA endpoint colour with 8 bits per channel.
pub type Endpoint = [u8; 4];

/// The direct LDR colour endpoint modes handled by the codec.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColourEndpointMode {
    /// Mode 0: two luminance values.
    Luminance,
    /// Mode 4: luminance and alpha for each endpoint.
    LuminanceAlpha,
    /// Mode 8: RGB for each endpoint.
    Rgb,
    /// Mode 12: RGBA for each endpoint.
    Rgba,
}

impl ColourEndpointMode {
    /// Looks up the mode stored in the 4-bit CEM field.
    pub fn from_raw(raw: u32) -> Result<Self, BlockError> {
        match raw {
            0 => Ok(Self::Luminance),
            4 => Ok(Self::LuminanceAlpha),
            8 => Ok(Self::Rgb),
            12 => Ok(Self::Rgba),
            other => Err(BlockError::ColourEndpointMode(other)),
        }
    }

    /// The mode that stores `num_components` input channels.
    pub fn for_components(num_components: usize) -> Self {
        match num_components {
            1 => Self::Luminance,
            2 => Self::LuminanceAlpha,
            3 => Self::Rgb,
            _ => Self::Rgba,
        }
    }

    /// Value stored in the 4-bit CEM field.
    pub const fn raw(self) -> u32 {
        match self {
            Self::Luminance => 0,
            Self::LuminanceAlpha => 4,
            Self::Rgb => 8,
            Self::Rgba => 12,
        }
    }

    /// Number of colour values stored for both endpoints.
    pub const fn value_count(self) -> usize {
        match self {
            Self::Luminance => 2,
            Self::LuminanceAlpha => 4,
            Self::Rgb => 6,
            Self::Rgba => 8,
        }
    }

    /// Whether the mode carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::LuminanceAlpha | Self::Rgba)
    }

    /// Expands stored colour values into the two endpoint colours.
    ///
    /// RGB modes apply blue contraction and swap the endpoints when the second
    /// endpoint is darker than the first.
    pub fn unpack(self, values: &[u8]) -> (Endpoint, Endpoint) {
        let v = |index: usize| values.get(index).copied().unwrap_or(0);
        match self {
            Self::Luminance => ([v(0), v(0), v(0), 0xFF], [v(1), v(1), v(1), 0xFF]),
            Self::LuminanceAlpha => ([v(0), v(0), v(0), v(2)], [v(1), v(1), v(1), v(3)]),
            Self::Rgb | Self::Rgba => {
                let (a0, a1) = match self {
                    Self::Rgba => (v(6), v(7)),
                    _ => (0xFF, 0xFF),
                };
                let sum0 = v(0) as u32 + v(2) as u32 + v(4) as u32;
                let sum1 = v(1) as u32 + v(3) as u32 + v(5) as u32;
                if sum1 >= sum0 {
                    ([v(0), v(2), v(4), a0], [v(1), v(3), v(5), a1])
                } else {
                    (
                        blue_contract([v(1), v(3), v(5), a1]),
                        blue_contract([v(0), v(2), v(4), a0]),
                    )
                }
            }
        }
    }

    /// Packs two endpoints into stored colour values.
    ///
    /// Returns `true` if the endpoints had to be stored swapped, in which case the
    /// caller must invert the weights. Swapping keeps RGB modes clear of blue contraction.
    pub fn pack(self, e0: &Endpoint, e1: &Endpoint, values: &mut [u8; 8]) -> bool {
        let swap = match self {
            Self::Rgb | Self::Rgba => rgb_sum(e1) < rgb_sum(e0),
            _ => false,
        };
        let (first, second) = if swap { (e1, e0) } else { (e0, e1) };

        match self {
            Self::Luminance => {
                values[0] = first[0];
                values[1] = second[0];
            }
            Self::LuminanceAlpha => {
                values[..4].copy_from_slice(&[first[0], second[0], first[3], second[3]]);
            }
            Self::Rgb => {
                values[..6].copy_from_slice(&[
                    first[0], second[0], first[1], second[1], first[2], second[2],
                ]);
            }
            Self::Rgba => {
                values.copy_from_slice(&[
                    first[0], second[0], first[1], second[1], first[2], second[2], first[3],
                    second[3],
                ]);
            }
        }
        swap
    }
}

#[inline]
fn rgb_sum(endpoint: &Endpoint) -> u32 {
    endpoint[0] as u32 + endpoint[1] as u32 + endpoint[2] as u32
}

#[inline]
fn blue_contract(colour: Endpoint) -> Endpoint {
    let [r, g, b, a] = colour.map(|c| c as u32);
    [((r + b) >> 1) as u8, ((g + b) >> 1) as u8, b as u8, a as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_expands_to_grey_and_opaque() {
        let (e0, e1) = ColourEndpointMode::Luminance.unpack(&[10, 200]);
        assert_eq!(e0, [10, 10, 10, 255]);
        assert_eq!(e1, [200, 200, 200, 255]);
    }

    #[test]
    fn luminance_alpha_keeps_alpha() {
        let (e0, e1) = ColourEndpointMode::LuminanceAlpha.unpack(&[10, 200, 30, 40]);
        assert_eq!(e0, [10, 10, 10, 30]);
        assert_eq!(e1, [200, 200, 200, 40]);
    }

    #[test]
    fn darker_second_endpoint_applies_blue_contraction() {
        let (e0, e1) = ColourEndpointMode::Rgb.unpack(&[100, 20, 100, 20, 100, 40]);
        assert_eq!(e0, [30, 30, 40, 255]);
        assert_eq!(e1, [100, 100, 100, 255]);
    }

    #[test]
    fn packing_swaps_to_avoid_blue_contraction() {
        let e0 = [200, 180, 160, 255];
        let e1 = [10, 20, 30, 128];
        let mut values = [0; 8];
        let swapped = ColourEndpointMode::Rgba.pack(&e0, &e1, &mut values);
        assert!(swapped);

        let (first, second) = ColourEndpointMode::Rgba.unpack(&values);
        assert_eq!(first, e1);
        assert_eq!(second, e0);
    }

    #[test]
    fn packing_in_order_round_trips() {
        let e0 = [10, 20, 30, 40];
        let e1 = [50, 60, 70, 80];
        let mut values = [0; 8];
        assert!(!ColourEndpointMode::Rgba.pack(&e0, &e1, &mut values));
        assert_eq!(ColourEndpointMode::Rgba.unpack(&values), (e0, e1));
    }

    #[test]
    fn only_direct_ldr_modes_are_accepted() {
        for raw in 0..16 {
            let result = ColourEndpointMode::from_raw(raw);
            match raw {
                0 | 4 | 8 | 12 => assert_eq!(result.unwrap().raw(), raw),
                _ => assert_eq!(result, Err(BlockError::ColourEndpointMode(raw))),
            }
        }
    }
}
