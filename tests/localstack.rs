use aws_sdk_dynamodb::types;
use aws_utils::dynamodb::{self, key, key_condition};
use aws_utils::localstack::{Localstack, LocalstackConfig, Service};
use aws_utils::{Error, s3, session, sqs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct City {
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Population")]
    population: u64,
}

fn city(state: &str, id: u32, population: u64) -> City {
    City {
        state: state.to_string(),
        id,
        population,
    }
}

fn hash_index(index_name: &str, attribute_name: &str) -> types::GlobalSecondaryIndex {
    types::GlobalSecondaryIndex::builder()
        .index_name(index_name)
        .key_schema(
            types::KeySchemaElement::builder()
                .attribute_name(attribute_name)
                .key_type(types::KeyType::Hash)
                .build()
                .unwrap(),
        )
        .projection(
            types::Projection::builder()
                .projection_type(types::ProjectionType::All)
                .build(),
        )
        .build()
        .unwrap()
}

async fn create_cities_table() {
    let client = session::get().await.dynamodb();
    client
        .create_table()
        .table_name("cities")
        .attribute_definitions(
            types::AttributeDefinition::builder()
                .attribute_name("State")
                .attribute_type(types::ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .attribute_definitions(
            types::AttributeDefinition::builder()
                .attribute_name("Id")
                .attribute_type(types::ScalarAttributeType::N)
                .build()
                .unwrap(),
        )
        .attribute_definitions(
            types::AttributeDefinition::builder()
                .attribute_name("Population")
                .attribute_type(types::ScalarAttributeType::N)
                .build()
                .unwrap(),
        )
        .global_secondary_indexes(hash_index("by-state", "State"))
        .global_secondary_indexes(hash_index("by-population", "Population"))
        .key_schema(
            types::KeySchemaElement::builder()
                .attribute_name("State")
                .key_type(types::KeyType::Hash)
                .build()
                .unwrap(),
        )
        .key_schema(
            types::KeySchemaElement::builder()
                .attribute_name("Id")
                .key_type(types::KeyType::Range)
                .build()
                .unwrap(),
        )
        .billing_mode(types::BillingMode::PayPerRequest)
        .send()
        .await
        .unwrap();
}

async fn exercise_dynamodb() {
    create_cities_table().await;
    for id in 1..=5 {
        dynamodb::put_item("cities", city("NJ", id, u64::from(id) * 100))
            .await
            .unwrap();
    }

    let found: City = dynamodb::get_item("cities", key::Keys::composite("State", "NJ", "Id", 3))
        .await
        .unwrap();
    assert_eq!(found, city("NJ", 3, 300));

    let missing = dynamodb::get_item::<City, _, _>(
        "cities",
        key::Keys::composite("State", "NY", "Id", 1),
    )
    .await;
    assert!(matches!(missing, Err(Error::ItemNotFound)));

    let by_population: City =
        dynamodb::find_one_from_index("cities", "by-population", key::Keys::partition("Population", 300))
            .await
            .unwrap();
    assert_eq!(by_population, city("NJ", 3, 300));
    let several = dynamodb::find_one_from_index::<City, _, _>(
        "cities",
        "by-state",
        key::Keys::partition("State", "NJ"),
    )
    .await;
    assert!(matches!(several, Err(Error::MultipleItemsFound)));
    let nowhere = dynamodb::find_one_from_index::<City, _, _>(
        "cities",
        "by-state",
        key::Keys::partition("State", "NY"),
    )
    .await;
    assert!(matches!(nowhere, Err(Error::ItemNotFound)));

    let no_fields = dynamodb::update_item(
        "cities",
        key::Keys::composite("State", "NJ", "Id", 3),
        Vec::<(String, u64)>::new(),
    )
    .await;
    assert!(matches!(no_fields, Err(Error::InvalidArgument(_))));

    dynamodb::update_item(
        "cities",
        key::Keys::composite("State", "NJ", "Id", 3),
        [("Population", 360)],
    )
    .await
    .unwrap();
    let updated: City = dynamodb::get_item("cities", key::Keys::composite("State", "NJ", "Id", 3))
        .await
        .unwrap();
    assert_eq!(updated.population, 360);

    let upsert = dynamodb::update_item(
        "cities",
        key::Keys::composite("State", "NY", "Id", 1),
        [("Population", 1)],
    )
    .await;
    assert!(matches!(upsert, Err(Error::DynamoDb(_))));

    let between: Vec<City> = dynamodb::query(
        "cities",
        key_condition::KeyCondition::partition("State", "NJ")
            .with_sort_key("Id", key_condition::Comparison::Between(2, 4)),
    )
    .await
    .unwrap();
    assert_eq!(between.len(), 3);

    let none: Vec<City> = dynamodb::query("cities", key_condition::KeyCondition::partition("State", "NY"))
        .await
        .unwrap();
    assert!(none.is_empty());

    let batch = dynamodb::batch_get_item::<City, _, _>(
        "cities",
        vec![
            key::Keys::composite("State", "NJ", "Id", 1),
            key::Keys::composite("State", "NJ", "Id", 5),
            key::Keys::composite("State", "NY", "Id", 9),
        ],
    )
    .await
    .unwrap();
    assert_eq!(batch.items.len(), 2);
    assert!(batch.unprocessed_keys.is_empty());

    dynamodb::delete_item("cities", key::Keys::composite("State", "NJ", "Id", 1))
        .await
        .unwrap();
    dynamodb::delete_item("cities", key::Keys::composite("State", "NJ", "Id", 1))
        .await
        .unwrap();
}

async fn exercise_s3() {
    session::get()
        .await
        .s3()
        .create_bucket()
        .bucket("reports")
        .send()
        .await
        .unwrap();
    let location = s3::put_object("reports", "2024/01.json", r#"{"total":3}"#)
        .await
        .unwrap();
    assert!(location.ends_with("/reports/2024/01.json"));
    let location = s3::put_object("reports", "drafts/q1 #2.txt", "draft")
        .await
        .unwrap();
    assert!(location.ends_with("/reports/drafts/q1%20%232.txt"));
    assert_eq!(
        s3::get_object_as_string("reports", "2024/01.json").await.unwrap(),
        r#"{"total":3}"#
    );
    assert_eq!(
        s3::list_objects("reports", "2024/").await.unwrap(),
        vec!["2024/01.json".to_string()]
    );
    let missing = s3::get_object("reports", "nope").await;
    assert!(matches!(missing, Err(Error::GetObject { .. })));
}

async fn exercise_sqs() {
    let queue_url = session::get()
        .await
        .sqs()
        .create_queue()
        .queue_name("jobs")
        .send()
        .await
        .unwrap()
        .queue_url
        .unwrap();
    sqs::send_message(&queue_url, "run").await.unwrap();
    let messages = sqs::receive_messages(&queue_url, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, "run");
    sqs::delete_message(&queue_url, &messages[0].receipt_handle)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires the localstack CLI and docker"]
async fn test_against_localstack() {
    let services = [
        Service::DYNAMODB.on_edge(),
        Service::S3.on_edge(),
        Service::SQS.on_edge(),
    ];
    let localstack = Localstack::start(LocalstackConfig::default(), &services)
        .await
        .unwrap();
    session::init(localstack.session_config(services[0])).await;

    exercise_dynamodb().await;
    exercise_s3().await;
    exercise_sqs().await;

    localstack.stop().await.unwrap();
}
