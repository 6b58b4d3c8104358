use std::fmt;

use crate::array_map::ArrayMap;

/// What a single styling binding targets.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPrimitive {
    /// `[class.name]` / `[style.prop]`.
    Prop(String),
    /// `[class]` / `[style]`: a whole map. Matches every property.
    Map,
    /// A map binding whose value is routed to a directive input instead.
    Neutralized,
}

impl KeyPrimitive {
    pub fn prop(&self) -> Option<&str> {
        match self {
            KeyPrimitive::Prop(p) => Some(p),
            _ => None,
        }
    }
}

/// Key stored next to each binding in the priority list.
///
/// The first binding of each group (template or one directive) carries the static
/// values of everything below it, folded into `WithStatics`.
#[derive(Debug, Clone, PartialEq)]
pub enum StylingKey {
    Primitive(KeyPrimitive),
    WithStatics { statics: ArrayMap, key: KeyPrimitive },
}

impl StylingKey {
    pub fn prop(name: impl Into<String>) -> Self {
        StylingKey::Primitive(KeyPrimitive::Prop(name.into()))
    }

    pub fn map() -> Self {
        StylingKey::Primitive(KeyPrimitive::Map)
    }

    /// The key with any static wrapper removed.
    pub fn primitive(&self) -> &KeyPrimitive {
        match self {
            StylingKey::Primitive(key) => key,
            StylingKey::WithStatics { key, .. } => key,
        }
    }

    pub fn statics(&self) -> Option<&ArrayMap> {
        match self {
            StylingKey::Primitive(_) => None,
            StylingKey::WithStatics { statics, .. } => Some(statics),
        }
    }

    /// Attach `statics`, dropping the wrapper when there is nothing to carry.
    pub fn with_statics(key: KeyPrimitive, statics: ArrayMap) -> Self {
        if statics.is_empty() {
            StylingKey::Primitive(key)
        } else {
            StylingKey::WithStatics { statics, key }
        }
    }
}

/// Packed `(prev, next)` links plus duplicate flags of one binding.
///
/// ```text
/// bit 31..17  prev index (15 bits)
/// bit 16..2   next index (15 bits)
/// bit 1       a lower-priority binding shares this key
/// bit 0       a higher-priority binding shares this key
/// ```
///
/// Index `0` means "no link".
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct StylingRange(u32);

const PREV_SHIFT: u32 = 17;
const NEXT_SHIFT: u32 = 2;
const INDEX_MASK: u32 = 0x7FFF;
const PREV_DUPLICATE: u32 = 0x02;
const NEXT_DUPLICATE: u32 = 0x01;

impl StylingRange {
    pub const EMPTY: StylingRange = StylingRange(0);
    /// Largest slot index a link can hold.
    pub const MAX_INDEX: usize = INDEX_MASK as usize;

    pub fn new(prev: usize, next: usize) -> Self {
        debug_assert!(prev <= Self::MAX_INDEX && next <= Self::MAX_INDEX);
        StylingRange(((prev as u32) << PREV_SHIFT) | ((next as u32) << NEXT_SHIFT))
    }

    pub fn prev(self) -> usize {
        ((self.0 >> PREV_SHIFT) & INDEX_MASK) as usize
    }

    pub fn next(self) -> usize {
        ((self.0 >> NEXT_SHIFT) & INDEX_MASK) as usize
    }

    pub fn with_prev(self, prev: usize) -> Self {
        debug_assert!(prev <= Self::MAX_INDEX);
        StylingRange((self.0 & !(INDEX_MASK << PREV_SHIFT)) | ((prev as u32) << PREV_SHIFT))
    }

    pub fn with_next(self, next: usize) -> Self {
        debug_assert!(next <= Self::MAX_INDEX);
        StylingRange((self.0 & !(INDEX_MASK << NEXT_SHIFT)) | ((next as u32) << NEXT_SHIFT))
    }

    pub fn prev_duplicate(self) -> bool {
        self.0 & PREV_DUPLICATE != 0
    }

    pub fn next_duplicate(self) -> bool {
        self.0 & NEXT_DUPLICATE != 0
    }

    pub fn with_prev_duplicate(self) -> Self {
        StylingRange(self.0 | PREV_DUPLICATE)
    }

    pub fn with_next_duplicate(self) -> Self {
        StylingRange(self.0 | NEXT_DUPLICATE)
    }
}

impl fmt::Debug for StylingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StylingRange({}{} <-> {}{})",
            self.prev(),
            if self.prev_duplicate() { "*" } else { "" },
            self.next(),
            if self.next_duplicate() { "*" } else { "" },
        )
    }
}
