//! Listing statistics over sales and stock units.
//!
//! Profit on a sale record is clamped at zero, so the loss side of a
//! margin is only visible here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Sale, Stock};

/// Totals over a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Units sold net of refunds.
    pub total_sold: i64,
    /// Revenue on net units.
    pub total_revenue: Money,
    /// Sum of positive margins on net units.
    pub total_profit: Money,
    /// Magnitude of negative margins on net units.
    pub total_loss: Money,
    /// `refund_quantity × sell rate` over all sales.
    pub total_refunded: Money,
}

impl SalesSummary {
    /// Folds sales paired with the purchase rate of their stock unit.
    ///
    /// A sale whose stock unit is gone should be paired with `Money::zero()`.
    pub fn from_sales<'a, I>(sales: I) -> Self
    where
        I: IntoIterator<Item = (&'a Sale, Money)>,
    {
        sales
            .into_iter()
            .fold(SalesSummary::default(), |mut acc, (sale, cost)| {
                acc.add(sale, cost);
                acc
            })
    }

    fn add(&mut self, sale: &Sale, cost: Money) {
        let net = sale.net_sold();
        self.total_sold += net;
        self.total_revenue += sale.rate().multiply_quantity(net);
        self.total_refunded += sale.rate().multiply_quantity(sale.refund_quantity.max(0));

        let margin = (sale.rate() - cost).multiply_quantity(net);
        if margin.is_positive() {
            self.total_profit += margin;
        } else {
            self.total_loss += margin.abs();
        }
    }
}

/// Totals over a set of stock units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_stock: i64,
    /// Remaining units, each unit clamped to its total.
    pub total_remaining: i64,
    pub total_value: Money,
    pub remaining_value: Money,
    pub total_refunded_value: Money,
}

impl StockSummary {
    pub fn from_stocks<'a, I>(stocks: I) -> Self
    where
        I: IntoIterator<Item = &'a Stock>,
    {
        let mut acc = StockSummary::default();
        for stock in stocks {
            let rate = stock.rate();
            acc.total_stock += stock.total_product;
            acc.total_remaining += stock.remaining.min(stock.total_product);
            acc.total_value += rate.multiply_quantity(stock.total_product);
            acc.remaining_value += rate.multiply_quantity(stock.remaining);
            acc.total_refunded_value +=
                rate.multiply_quantity(stock.refund_quantity.min(stock.total_product));
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewSale, NewStock};
    use chrono::Utc;

    fn rupees(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    fn sale(id: &str, qty: i64, rate: i64, refunded: i64, cost: i64) -> Sale {
        let mut sale = Sale::from_new(
            NewSale {
                stock_id: "S1".to_string(),
                sale_id: id.to_string(),
                quantity_sold: qty,
                rate: rupees(rate),
                brand_name: String::new(),
                item_name: String::new(),
                colour_name: String::new(),
                unit: String::new(),
                agent_item_id: None,
            },
            rupees(cost),
            Utc::now(),
        );
        sale.refund_quantity = refunded;
        sale
    }

    #[test]
    fn test_sales_summary_splits_profit_and_loss() {
        let gain = sale("A", 20, 80, 5, 50);
        let loss = sale("B", 4, 40, 0, 50);

        let summary = SalesSummary::from_sales([(&gain, rupees(50)), (&loss, rupees(50))]);
        assert_eq!(summary.total_sold, 19);
        assert_eq!(summary.total_revenue, rupees(15 * 80 + 4 * 40));
        assert_eq!(summary.total_profit, rupees(450));
        assert_eq!(summary.total_loss, rupees(40));
        assert_eq!(summary.total_refunded, rupees(400));
    }

    #[test]
    fn test_stock_summary() {
        let mut stock = Stock::from_new(
            NewStock {
                stock_id: "S1".to_string(),
                brand_name: String::new(),
                item_name: String::new(),
                colour_name: String::new(),
                unit: String::new(),
                total_product: 100,
                rate: rupees(50),
            },
            Utc::now(),
        );
        stock.remaining = 85;
        stock.refund_quantity = 5;

        let summary = StockSummary::from_stocks([&stock]);
        assert_eq!(summary.total_stock, 100);
        assert_eq!(summary.total_remaining, 85);
        assert_eq!(summary.total_value, rupees(5000));
        assert_eq!(summary.remaining_value, rupees(4250));
        assert_eq!(summary.total_refunded_value, rupees(250));
    }

    #[test]
    fn test_empty_summaries_are_zero() {
        assert_eq!(SalesSummary::from_sales(std::iter::empty()), SalesSummary::default());
        assert_eq!(StockSummary::from_stocks(std::iter::empty()), StockSummary::default());
    }
}
