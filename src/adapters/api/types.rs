//! Item Lookup Response Decoding
//!
//! Maps the generic XML tree of an `ItemLookupResponse` (or a top-level
//! `ItemLookupErrorResponse`) onto the typed lookup schema. Every field
//! the vendor may repeat goes through `XmlValue::items` here, so the
//! single-vs-sequence ambiguity ends at this boundary.

use crate::domain::error::IngestError;
use crate::domain::lookup::{
  ItemAttributes, LookupItem, LookupResponse, Money, Offer, OfferListing, OfferSection,
};

use super::xml::{XmlTree, XmlValue};

impl TryFrom<&XmlTree> for LookupResponse {
  type Error = IngestError;

  fn try_from(root: &XmlTree) -> Result<Self, Self::Error> {
    // Signature / throttling failures come back as a separate document.
    if let Some(error) = root.path(&["ItemLookupErrorResponse", "Error"]) {
      return Ok(vendor_error(error));
    }

    let items = root
      .path(&["ItemLookupResponse", "Items"])
      .and_then(XmlValue::as_tree)
      .ok_or_else(|| IngestError::Parse("response has no ItemLookupResponse/Items".to_string()))?;

    if let Some(error) = items.path(&["Request", "Errors", "Error"]) {
      return Ok(vendor_error(error));
    }

    let item = items
      .get("Item")
      .and_then(|v| v.first().as_tree())
      .ok_or_else(|| IngestError::Parse("response has neither Item nor Errors".to_string()))?;

    Ok(Self::Item(Box::new(decode_item(item)?)))
  }
}

fn vendor_error(error: &XmlValue) -> LookupResponse {
  let error = error.first().as_tree();
  let field = |name: &str| error.and_then(|e| e.text(&[name])).unwrap_or_default();
  LookupResponse::VendorError {
    code: field("Code"),
    message: field("Message"),
  }
}

fn decode_item(item: &XmlTree) -> Result<LookupItem, IngestError> {
  let sales_rank = item
    .text(&["SalesRank"])
    .map(|rank| {
      rank
        .parse::<u64>()
        .map_err(|_| IngestError::Parse(format!("SalesRank {rank:?} is not an integer")))
    })
    .transpose()?;

  let image_sets = item
    .get("ImageSets")
    .and_then(|sets| sets.first().as_tree())
    .and_then(|sets| sets.get("ImageSet"))
    .map(|sets| {
      sets
        .items()
        .into_iter()
        .filter_map(|set| set.as_tree()?.text(&["LargeImage", "URL"]))
        .collect()
    })
    .unwrap_or_default();

  let attributes = item
    .get("ItemAttributes")
    .and_then(|v| v.first().as_tree())
    .map(|attrs| ItemAttributes {
      upc: attrs.text(&["UPC"]),
      ean: attrs.text(&["EAN"]),
      list_price: money(attrs, "ListPrice"),
    })
    .unwrap_or_default();

  let offers = item
    .get("Offers")
    .map(|v| v.first().as_tree().map(decode_offers).unwrap_or_default());

  Ok(LookupItem {
    asin: item.text(&["ASIN"]),
    large_image: item.text(&["LargeImage", "URL"]),
    image_sets,
    sales_rank,
    attributes,
    offers,
  })
}

fn decode_offers(section: &XmlTree) -> OfferSection {
  let offers = section
    .get("Offer")
    .map(|offers| {
      offers
        .items()
        .into_iter()
        .filter_map(XmlValue::as_tree)
        .map(decode_offer)
        .collect()
    })
    .unwrap_or_default();

  OfferSection {
    // The vendor sends a bare `0` instead of a URL when nothing is on offer.
    more_offers_url: section
      .text(&["MoreOffersUrl"])
      .filter(|url| url.starts_with("http")),
    offers,
  }
}

fn decode_offer(offer: &XmlTree) -> Offer {
  let listing = offer
    .get("OfferListing")
    .and_then(|v| v.first().as_tree())
    .map(|listing| OfferListing {
      price: money(listing, "Price"),
      sale_price: money(listing, "SalePrice"),
      prime_eligible: listing.text(&["IsEligibleForPrime"]).as_deref() == Some("1"),
    });

  Offer {
    condition: offer.text(&["OfferAttributes", "Condition"]),
    merchant: offer.text(&["Merchant", "Name"]),
    listing,
  }
}

fn money(parent: &XmlTree, name: &str) -> Option<Money> {
  let node = parent.get(name)?.first().as_tree()?;
  Some(Money {
    amount: node.text(&["Amount"]),
    currency_code: node.text(&["CurrencyCode"]),
    formatted: node.text(&["FormattedPrice"]),
  })
}
