// flags.rs — brush contents and surface flags
//
// Bit positions are shared with every caller of the collision model (game
// logic, movement, AI, the map compiler) and must never be renumbered.

// ============================================================
// Content flags
// ============================================================

bitflags::bitflags! {
    /// Contents of a brush or leaf. Lower bits are visible contents.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Contents: u32 {
        const SOLID          = 1 << 0;
        const WINDOW         = 1 << 1;
        const AUX            = 1 << 2;
        const LAVA           = 1 << 3;
        const SLIME          = 1 << 4;
        const WATER          = 1 << 5;
        const MIST           = 1 << 6;

        const NO_WATERJUMP   = 1 << 13;
        const PROJECTILECLIP = 1 << 14;
        const AREAPORTAL     = 1 << 15;
        const PLAYERCLIP     = 1 << 16;
        const MONSTERCLIP    = 1 << 17;

        const CURRENT_0      = 1 << 18;
        const CURRENT_90     = 1 << 19;
        const CURRENT_180    = 1 << 20;
        const CURRENT_270    = 1 << 21;
        const CURRENT_UP     = 1 << 22;
        const CURRENT_DOWN   = 1 << 23;

        const ORIGIN         = 1 << 24;
        const MONSTER        = 1 << 25;
        const DEADMONSTER    = 1 << 26;
        const DETAIL         = 1 << 27;
        const TRANSLUCENT    = 1 << 28;
        const LADDER         = 1 << 29;
        const PLAYER         = 1 << 30;
        const PROJECTILE     = 1 << 31;
    }
}

pub const LAST_VISIBLE_CONTENTS: Contents = Contents::MIST;

// ============================================================
// Content masks
// ============================================================

pub const MASK_ALL: Contents = Contents::from_bits_retain(u32::MAX);
pub const MASK_SOLID: Contents = Contents::SOLID.union(Contents::WINDOW);
pub const MASK_PLAYERSOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW)
    .union(Contents::MONSTER)
    .union(Contents::PLAYER);
pub const MASK_DEADSOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW);
pub const MASK_MONSTERSOLID: Contents = Contents::SOLID
    .union(Contents::MONSTERCLIP)
    .union(Contents::WINDOW)
    .union(Contents::MONSTER)
    .union(Contents::PLAYER);
pub const MASK_WATER: Contents = Contents::WATER
    .union(Contents::LAVA)
    .union(Contents::SLIME);
pub const MASK_OPAQUE: Contents = Contents::SOLID
    .union(Contents::SLIME)
    .union(Contents::LAVA);
pub const MASK_SHOT: Contents = Contents::SOLID
    .union(Contents::MONSTER)
    .union(Contents::PLAYER)
    .union(Contents::WINDOW)
    .union(Contents::DEADMONSTER);
pub const MASK_CURRENT: Contents = Contents::CURRENT_0
    .union(Contents::CURRENT_90)
    .union(Contents::CURRENT_180)
    .union(Contents::CURRENT_270)
    .union(Contents::CURRENT_UP)
    .union(Contents::CURRENT_DOWN);
pub const MASK_BLOCK_SIGHT: Contents = Contents::SOLID
    .union(Contents::LAVA)
    .union(Contents::SLIME)
    .union(Contents::MONSTER)
    .union(Contents::PLAYER);
pub const MASK_NAV_SOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW);
pub const MASK_LADDER_NAV_SOLID: Contents = Contents::SOLID.union(Contents::WINDOW);
pub const MASK_WALK_NAV_SOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::WINDOW)
    .union(Contents::MONSTERCLIP);
pub const MASK_PROJECTILE: Contents = MASK_SHOT.union(Contents::PROJECTILECLIP);

// ============================================================
// Surface flags
// ============================================================

bitflags::bitflags! {
    /// Per-side surface flags carried into a trace result from the side that
    /// produced the contact.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SurfaceFlags: u32 {
        const LIGHT           = 1 << 0;
        const SLICK           = 1 << 1;
        const SKY             = 1 << 2;
        const WARP            = 1 << 3;
        const TRANS33         = 1 << 4;
        const TRANS66         = 1 << 5;
        const FLOWING         = 1 << 6;
        const NODRAW          = 1 << 7;
        const ALPHATEST       = 1 << 25;
        const N64_UV          = 1 << 28;
        const N64_SCROLL_X    = 1 << 29;
        const N64_SCROLL_Y    = 1 << 30;
        const N64_SCROLL_FLIP = 1 << 31;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_bit_positions() {
        let expectations = [
            (Contents::SOLID, 1u32 << 0),
            (Contents::WINDOW, 1 << 1),
            (Contents::AUX, 1 << 2),
            (Contents::LAVA, 1 << 3),
            (Contents::SLIME, 1 << 4),
            (Contents::WATER, 1 << 5),
            (Contents::MIST, 1 << 6),
            (Contents::NO_WATERJUMP, 1 << 13),
            (Contents::PROJECTILECLIP, 1 << 14),
            (Contents::AREAPORTAL, 1 << 15),
            (Contents::PLAYERCLIP, 1 << 16),
            (Contents::MONSTERCLIP, 1 << 17),
            (Contents::CURRENT_0, 1 << 18),
            (Contents::CURRENT_90, 1 << 19),
            (Contents::CURRENT_180, 1 << 20),
            (Contents::CURRENT_270, 1 << 21),
            (Contents::CURRENT_UP, 1 << 22),
            (Contents::CURRENT_DOWN, 1 << 23),
            (Contents::ORIGIN, 1 << 24),
            (Contents::MONSTER, 1 << 25),
            (Contents::DEADMONSTER, 1 << 26),
            (Contents::DETAIL, 1 << 27),
            (Contents::TRANSLUCENT, 1 << 28),
            (Contents::LADDER, 1 << 29),
            (Contents::PLAYER, 1 << 30),
            (Contents::PROJECTILE, 1 << 31),
        ];
        for (flag, bits) in expectations {
            assert_eq!(flag.bits(), bits, "{:?}", flag);
        }
        assert_eq!(LAST_VISIBLE_CONTENTS, Contents::MIST);
    }

    #[test]
    fn test_masks() {
        assert_eq!(MASK_SOLID, Contents::SOLID | Contents::WINDOW);
        assert_eq!(MASK_WATER, Contents::WATER | Contents::LAVA | Contents::SLIME);
        assert_eq!(
            MASK_PLAYERSOLID,
            Contents::SOLID
                | Contents::PLAYERCLIP
                | Contents::WINDOW
                | Contents::MONSTER
                | Contents::PLAYER
        );
        assert_eq!(
            MASK_DEADSOLID,
            Contents::SOLID | Contents::PLAYERCLIP | Contents::WINDOW
        );
        assert_eq!(
            MASK_MONSTERSOLID,
            Contents::SOLID
                | Contents::MONSTERCLIP
                | Contents::WINDOW
                | Contents::MONSTER
                | Contents::PLAYER
        );
        assert_eq!(MASK_OPAQUE, Contents::SOLID | Contents::SLIME | Contents::LAVA);
        assert_eq!(
            MASK_SHOT,
            Contents::SOLID
                | Contents::MONSTER
                | Contents::PLAYER
                | Contents::WINDOW
                | Contents::DEADMONSTER
        );
        assert_eq!(
            MASK_CURRENT.bits(),
            (1 << 18) | (1 << 19) | (1 << 20) | (1 << 21) | (1 << 22) | (1 << 23)
        );
        assert_eq!(MASK_NAV_SOLID, MASK_DEADSOLID);
        assert_eq!(MASK_LADDER_NAV_SOLID, MASK_SOLID);
        assert_eq!(MASK_WALK_NAV_SOLID, MASK_NAV_SOLID | Contents::MONSTERCLIP);
        assert_eq!(MASK_PROJECTILE, MASK_SHOT | Contents::PROJECTILECLIP);
        assert_eq!(MASK_ALL.bits(), u32::MAX);
    }

    #[test]
    fn test_surface_bit_positions() {
        assert_eq!(SurfaceFlags::LIGHT.bits(), 1);
        assert_eq!(SurfaceFlags::NODRAW.bits(), 1 << 7);
        assert_eq!(SurfaceFlags::ALPHATEST.bits(), 1 << 25);
        assert_eq!(SurfaceFlags::N64_SCROLL_FLIP.bits(), 1 << 31);
        assert!(SurfaceFlags::default().is_empty());
    }

    #[test]
    fn test_unknown_bits_survive_round_trip() {
        let raw = Contents::from_bits_retain(0x0000_1000);
        assert_eq!(raw.bits(), 0x1000);
        assert!(MASK_ALL.contains(raw));
        assert!(!MASK_SOLID.intersects(raw));
    }
}
