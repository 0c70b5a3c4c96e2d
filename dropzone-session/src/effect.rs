bitflags::bitflags! {
    /// Drop effects a source allows or a target is willing to perform.
    ///
    /// The empty set is the "none" effect: nothing acceptable here.
    pub struct DropEffect: u32 {
        const COPY = 0x1;
        const MOVE = 0x2;
        const LINK = 0x4;
    }
}

impl DropEffect {
    /// Effects in the order they win when several are possible.
    pub const PRIORITY: [DropEffect; 3] = [DropEffect::MOVE, DropEffect::COPY, DropEffect::LINK];

    /// Highest priority single effect contained in `self`.
    pub fn preferred(self) -> Option<DropEffect> {
        Self::PRIORITY
            .iter()
            .copied()
            .find(|effect| self.contains(*effect))
    }

    /// Effect agreed on between what the source offers (`self`) and what a target answered.
    pub fn negotiate(self, response: DropEffect) -> Option<DropEffect> {
        (self & response).preferred()
    }
}

/// Abstract feedback shown to the user while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorHint {
    /// Nothing under the pointer will take the drop.
    Forbidden,
    Copy,
    Move,
    Link,
    /// No drag feedback, the drag is over.
    Default,
}

impl CursorHint {
    /// Hint for a target `response` to a drag offering `offered`.
    pub fn for_response(offered: DropEffect, response: DropEffect) -> Self {
        match offered.negotiate(response) {
            Some(effect) if effect == DropEffect::MOVE => CursorHint::Move,
            Some(effect) if effect == DropEffect::COPY => CursorHint::Copy,
            Some(effect) if effect == DropEffect::LINK => CursorHint::Link,
            _ => CursorHint::Forbidden,
        }
    }
}

impl Default for CursorHint {
    fn default() -> Self {
        CursorHint::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_follows_priority() {
        assert_eq!(DropEffect::all().preferred(), Some(DropEffect::MOVE));
        assert_eq!(
            (DropEffect::COPY | DropEffect::LINK).preferred(),
            Some(DropEffect::COPY)
        );
        assert_eq!(DropEffect::LINK.preferred(), Some(DropEffect::LINK));
        assert_eq!(DropEffect::empty().preferred(), None);
    }

    #[test]
    fn negotiate_uses_intersection() {
        let offered = DropEffect::COPY | DropEffect::LINK;

        assert_eq!(
            offered.negotiate(DropEffect::MOVE | DropEffect::COPY),
            Some(DropEffect::COPY)
        );
        assert_eq!(offered.negotiate(DropEffect::MOVE), None);
        assert_eq!(offered.negotiate(DropEffect::empty()), None);
    }

    #[test]
    fn wire_values() {
        assert_eq!(DropEffect::empty().bits(), 0x0);
        assert_eq!(DropEffect::COPY.bits(), 0x1);
        assert_eq!(DropEffect::MOVE.bits(), 0x2);
        assert_eq!(DropEffect::LINK.bits(), 0x4);
    }

    #[test]
    fn cursor_hint_for_response() {
        let offered = DropEffect::all();

        assert_eq!(
            CursorHint::for_response(offered, DropEffect::COPY | DropEffect::MOVE),
            CursorHint::Move
        );
        assert_eq!(
            CursorHint::for_response(offered, DropEffect::LINK),
            CursorHint::Link
        );
        assert_eq!(
            CursorHint::for_response(offered, DropEffect::empty()),
            CursorHint::Forbidden
        );
        assert_eq!(
            CursorHint::for_response(DropEffect::MOVE, DropEffect::COPY),
            CursorHint::Forbidden
        );
        assert_eq!(CursorHint::default(), CursorHint::Forbidden);
    }
}
