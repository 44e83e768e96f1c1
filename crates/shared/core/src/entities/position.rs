use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::strategy::VenueKind;

/// Position side - long (bought) or short (sold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    /// Long position - bought the asset, profit when price rises
    Long,
    /// Short position - sold borrowed asset, profit when price falls
    Short,
}

impl PositionSide {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }

    /// The order side that reduces a position on this side
    pub fn closing_order_side(&self) -> super::Side {
        match self {
            PositionSide::Long => super::Side::Sell,
            PositionSide::Short => super::Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Aggregate exposure to one symbol.
///
/// The ledger keeps at most one `Open` position per symbol: same-side fills
/// re-average the entry, opposite-direction fills reduce the quantity and
/// realize P&L until the position closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub side: PositionSide,
    pub venue: VenueKind,
    /// Leverage multiple; 1 for spot
    pub leverage: u32,
    pub quantity: Decimal,
    /// Quantity-weighted average entry price
    pub entry_price: Decimal,
    /// Price at which the last reducing fill executed; set on close
    pub exit_price: Option<Decimal>,
    /// Leveraged venues only, computed once when the position is opened
    pub liquidation_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub stop_loss_order_id: Option<Uuid>,
    pub entry_order_id: Option<Uuid>,
    pub exit_order_id: Option<Uuid>,
    pub realized_pnl: Decimal,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Open a new position from an entry fill.
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        venue: VenueKind,
        leverage: u32,
        quantity: Decimal,
        entry_price: Decimal,
        entry_order_id: Option<Uuid>,
    ) -> Self {
        let liquidation_price = match venue {
            VenueKind::Spot => None,
            VenueKind::Leveraged => Some(Self::liquidation_price(side, entry_price, leverage)),
        };

        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            venue,
            leverage,
            quantity,
            entry_price,
            exit_price: None,
            liquidation_price,
            stop_loss_price: None,
            stop_loss_order_id: None,
            entry_order_id,
            exit_order_id: None,
            realized_pnl: Decimal::ZERO,
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Liquidation price at entry.
    ///
    /// Long: entry * (1 - 1/leverage); Short: entry * (1 + 1/leverage).
    pub fn liquidation_price(side: PositionSide, entry_price: Decimal, leverage: u32) -> Decimal {
        let inverse = Decimal::ONE / Decimal::from(leverage.max(1));
        match side {
            PositionSide::Long => entry_price * (Decimal::ONE - inverse),
            PositionSide::Short => entry_price * (Decimal::ONE + inverse),
        }
    }

    /// Notional value at the given mark price
    pub fn notional_at(&self, mark_price: Decimal) -> Decimal {
        self.quantity * mark_price
    }

    /// Extend the position with a same-side fill, re-averaging the entry.
    ///
    /// The liquidation price is intentionally not recomputed here; it keeps
    /// its first-entry value.
    pub fn extend(&mut self, quantity: Decimal, price: Decimal) {
        let old_notional = self.quantity * self.entry_price;
        let new_notional = quantity * price;
        let total_quantity = self.quantity + quantity;

        if total_quantity > Decimal::ZERO {
            self.entry_price = (old_notional + new_notional) / total_quantity;
        }
        self.quantity = total_quantity;
    }

    /// Reduce the position with an opposite-direction fill, realizing P&L.
    ///
    /// If the reducing quantity reaches the open quantity the position
    /// transitions to `Closed`. Returns the P&L realized by this fill.
    pub fn reduce(
        &mut self,
        quantity: Decimal,
        price: Decimal,
        exit_order_id: Option<Uuid>,
    ) -> Decimal {
        let reduce_qty = quantity.min(self.quantity);
        let price_diff = price - self.entry_price;
        let pnl = match self.side {
            PositionSide::Long => reduce_qty * price_diff,
            PositionSide::Short => reduce_qty * -price_diff,
        };

        self.realized_pnl += pnl;
        self.quantity -= reduce_qty;

        if self.quantity <= Decimal::ZERO {
            self.quantity = Decimal::ZERO;
            self.status = PositionStatus::Closed;
            self.exit_price = Some(price);
            self.exit_order_id = exit_order_id;
            self.closed_at = Some(Utc::now());
        }

        pnl
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_1_at_100() -> Position {
        Position::open(
            "BTCUSDT",
            PositionSide::Long,
            VenueKind::Spot,
            1,
            dec!(1.0),
            dec!(100),
            None,
        )
    }

    #[test]
    fn spot_position_has_no_liquidation_price() {
        let pos = long_1_at_100();
        assert!(pos.liquidation_price.is_none());
    }

    #[test]
    fn leveraged_liquidation_price_at_entry() {
        let long = Position::open(
            "ETHUSDT",
            PositionSide::Long,
            VenueKind::Leveraged,
            5,
            dec!(2),
            dec!(1000),
            None,
        );
        // 1000 * (1 - 1/5) = 800
        assert_eq!(long.liquidation_price, Some(dec!(800)));

        let short = Position::open(
            "ETHUSDT",
            PositionSide::Short,
            VenueKind::Leveraged,
            4,
            dec!(2),
            dec!(1000),
            None,
        );
        // 1000 * (1 + 1/4) = 1250
        assert_eq!(short.liquidation_price, Some(dec!(1250)));
    }

    #[test]
    fn extend_reaverages_entry_price() {
        let mut pos = long_1_at_100();
        pos.extend(dec!(1.0), dec!(110));

        assert_eq!(pos.quantity, dec!(2.0));
        assert_eq!(pos.entry_price, dec!(105));
        assert!(pos.is_open());
    }

    #[test]
    fn extend_does_not_touch_liquidation_price() {
        let mut pos = Position::open(
            "ETHUSDT",
            PositionSide::Long,
            VenueKind::Leveraged,
            5,
            dec!(1),
            dec!(1000),
            None,
        );
        let before = pos.liquidation_price;
        pos.extend(dec!(1), dec!(1200));
        assert_eq!(pos.liquidation_price, before);
    }

    #[test]
    fn partial_reduce_realizes_proportional_pnl() {
        let mut pos = long_1_at_100();
        pos.extend(dec!(1.0), dec!(110)); // 2.0 @ 105

        let pnl = pos.reduce(dec!(0.5), dec!(120), None);
        assert_eq!(pnl, dec!(7.5));
        assert_eq!(pos.realized_pnl, dec!(7.5));
        assert_eq!(pos.quantity, dec!(1.5));
        assert!(pos.is_open());
    }

    #[test]
    fn full_reduce_closes_with_cumulative_pnl() {
        let mut pos = long_1_at_100();
        pos.extend(dec!(1.0), dec!(110)); // 2.0 @ 105
        pos.reduce(dec!(0.5), dec!(120), None); // +7.5

        let exit_order = Uuid::new_v4();
        let pnl = pos.reduce(dec!(1.5), dec!(100), Some(exit_order));
        assert_eq!(pnl, dec!(-7.5));
        assert_eq!(pos.realized_pnl, dec!(0.0));
        assert_eq!(pos.status, PositionStatus::Closed);
        assert_eq!(pos.exit_price, Some(dec!(100)));
        assert_eq!(pos.exit_order_id, Some(exit_order));
        assert!(pos.closed_at.is_some());
    }

    #[test]
    fn over_reduce_closes_without_flipping() {
        let mut pos = long_1_at_100();
        let pnl = pos.reduce(dec!(2.0), dec!(110), None);

        // Only the open quantity realizes P&L; the excess is ignored.
        assert_eq!(pnl, dec!(10));
        assert_eq!(pos.quantity, Decimal::ZERO);
        assert_eq!(pos.status, PositionStatus::Closed);
    }

    #[test]
    fn short_reduce_pnl_sign() {
        let mut pos = Position::open(
            "ETHUSDT",
            PositionSide::Short,
            VenueKind::Leveraged,
            3,
            dec!(1),
            dec!(100),
            None,
        );
        let pnl = pos.reduce(dec!(1), dec!(90), None);
        assert_eq!(pnl, dec!(10));
        assert_eq!(pos.status, PositionStatus::Closed);
    }
}
