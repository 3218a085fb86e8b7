use chrono::{NaiveDate, NaiveDateTime};
use storeforge_core::{
    Category, CompetitorListing, Customer, EconomicIndicator, Product, Record, Segment,
    SocialMention, Transaction, WeatherObservation,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

fn timestamp() -> NaiveDateTime {
    date().and_hms_opt(12, 30, 0).expect("valid time")
}

fn header_of<R: Record>(record: &R) -> Vec<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.serialize(record).expect("serialize record");
    let bytes = writer.into_inner().expect("flush");
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect()
}

fn assert_header_matches<R: Record>(record: &R) {
    let expected: Vec<String> = R::schema()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(header_of(record), expected, "{}", R::schema().name);
}

#[test]
fn serialized_headers_follow_declared_column_order() {
    assert_header_matches(&Customer {
        customer_id: "CUST_000001".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        address: None,
        city: Some("London".to_string()),
        state: None,
        zip_code: None,
        country: "USA".to_string(),
        date_joined: date(),
        segment: Segment::Premium,
        lifetime_value: 120.5,
    });
    assert_header_matches(&Product {
        product_id: "PROD_000001".to_string(),
        name: "Lamp".to_string(),
        description: None,
        category: Category::HomeAndGarden,
        brand: Some("Acme".to_string()),
        price: 20.0,
        cost: 12.0,
        weight_kg: Some(1.5),
        dimensions: Some("10x10x10".to_string()),
        stock_quantity: 3,
        rating: Some(4.2),
        reviews_count: 7,
        date_added: date(),
    });
    assert_header_matches(&Transaction {
        transaction_id: "TXN_00000001".to_string(),
        customer_id: "CUST_000001".to_string(),
        product_id: "PROD_000001".to_string(),
        quantity: 2,
        unit_price: 20.0,
        total_amount: 40.0,
        discount_amount: 4.0,
        tax_amount: 2.88,
        shipping_cost: 5.0,
        payment_method: "Credit Card".to_string(),
        transaction_date: timestamp(),
        order_status: "Delivered".to_string(),
        channel: "Website".to_string(),
    });
    assert_header_matches(&WeatherObservation {
        observation_id: "WTH_Chicago_20240301".to_string(),
        city: "Chicago".to_string(),
        observed_at: timestamp(),
        temperature_c: 4.5,
        humidity: 70,
        condition: "Clouds".to_string(),
        source: "openweathermap".to_string(),
    });
    assert_header_matches(&EconomicIndicator {
        indicator_id: "UNRATE:2024-03-01".to_string(),
        series_id: "UNRATE".to_string(),
        observation_date: date(),
        value: 3.9,
        source: "fred".to_string(),
    });
    assert_header_matches(&SocialMention {
        mention_id: "reddit:abc".to_string(),
        platform: "reddit".to_string(),
        keyword: "ecommerce".to_string(),
        title: "Shops".to_string(),
        score: 10,
        comments: 2,
        community: None,
        author: None,
        url: None,
        created_at: timestamp(),
        scraped_at: timestamp(),
    });
    assert_header_matches(&CompetitorListing {
        listing_id: "books:1:1".to_string(),
        category: "books".to_string(),
        name: "Novel".to_string(),
        price: 9.99,
        rating: None,
        page: 1,
        position: 1,
        source: "competitor".to_string(),
        scraped_at: timestamp(),
    });
}

#[test]
fn serializes_enums_and_nulls_as_flat_fields() {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .serialize(Product {
            product_id: "PROD_000002".to_string(),
            name: "Rake".to_string(),
            description: None,
            category: Category::HomeAndGarden,
            brand: None,
            price: 15.0,
            cost: 9.0,
            weight_kg: None,
            dimensions: None,
            stock_quantity: 0,
            rating: None,
            reviews_count: 0,
            date_added: date(),
        })
        .expect("serialize");
    let text = String::from_utf8(writer.into_inner().expect("flush")).expect("utf8");
    let row = text.lines().nth(1).expect("data row");
    assert_eq!(row, "PROD_000002,Rake,,Home & Garden,,15.0,9.0,,,0,,0,2024-03-01");
}
