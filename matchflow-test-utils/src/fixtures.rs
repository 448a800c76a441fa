// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Domain fixtures for join scenarios: orders matched with shipments by
//! order id, producing deliveries.

/// An order placed by a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: u32,
    pub customer: String,
}

/// A shipment fulfilling one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub order_id: u32,
    pub carrier: String,
}

/// The pairing of an order with its shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub order_id: u32,
    pub customer: String,
    pub carrier: String,
}

impl Delivery {
    /// Combines an order and its shipment; the shape expected of a join
    /// combiner.
    pub fn from_parts(order: Order, shipment: Shipment) -> Self {
        Self {
            order_id: order.id,
            customer: order.customer,
            carrier: shipment.carrier,
        }
    }
}

pub fn order(id: u32, customer: &str) -> Order {
    Order {
        id,
        customer: customer.to_owned(),
    }
}

pub fn shipment(order_id: u32, carrier: &str) -> Shipment {
    Shipment {
        order_id,
        carrier: carrier.to_owned(),
    }
}

pub fn delivery(order_id: u32, customer: &str, carrier: &str) -> Delivery {
    Delivery {
        order_id,
        customer: customer.to_owned(),
        carrier: carrier.to_owned(),
    }
}
