use std::fmt;

/// Port of the LocalStack edge router, which serves every service.
pub const EDGE_PORT: u16 = 4566;

/// An AWS service emulated by LocalStack.
///
/// The associated constants carry the legacy per-service ports; use [`Service::on_edge`]
/// for LocalStack versions that only listen on [`EDGE_PORT`].
///
/// ```rust
/// use aws_utils::localstack::Service;
///
/// assert_eq!(Service::DYNAMODB.endpoint_url(), "http://localhost:4569");
/// assert_eq!(Service::DYNAMODB.on_edge().endpoint_url(), "http://localhost:4566");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Service {
    /// Name used in the `SERVICES` variable.
    pub name: &'static str,
    /// Port the service listens on.
    pub port: u16,
}

impl Service {
    /// API Gateway.
    pub const API_GATEWAY: Self = Self::new("apigateway", 4567);
    /// Kinesis.
    pub const KINESIS: Self = Self::new("kinesis", 4568);
    /// DynamoDB.
    pub const DYNAMODB: Self = Self::new("dynamodb", 4569);
    /// DynamoDB Streams.
    pub const DYNAMODB_STREAMS: Self = Self::new("dynamodbstreams", 4570);
    /// S3.
    pub const S3: Self = Self::new("s3", 4572);
    /// Kinesis Data Firehose.
    pub const FIREHOSE: Self = Self::new("firehose", 4573);
    /// Lambda.
    pub const LAMBDA: Self = Self::new("lambda", 4574);
    /// SNS.
    pub const SNS: Self = Self::new("sns", 4575);
    /// SQS.
    pub const SQS: Self = Self::new("sqs", 4576);
    /// Redshift.
    pub const REDSHIFT: Self = Self::new("redshift", 4577);
    /// Elasticsearch Service.
    pub const ELASTICSEARCH_SERVICE: Self = Self::new("es", 4578);
    /// Simple Email Service.
    pub const SES: Self = Self::new("ses", 4579);
    /// Route 53.
    pub const ROUTE53: Self = Self::new("route53", 4580);
    /// CloudFormation.
    pub const CLOUDFORMATION: Self = Self::new("cloudformation", 4581);
    /// CloudWatch.
    pub const CLOUDWATCH: Self = Self::new("cloudwatch", 4582);
    /// Systems Manager.
    pub const SSM: Self = Self::new("ssm", 4583);
    /// Secrets Manager.
    pub const SECRETS_MANAGER: Self = Self::new("secretsmanager", 4584);
    /// Step Functions.
    pub const STEP_FUNCTIONS: Self = Self::new("stepfunctions", 4585);
    /// CloudWatch Logs.
    pub const CLOUDWATCH_LOGS: Self = Self::new("logs", 4586);
    /// Security Token Service.
    pub const STS: Self = Self::new("sts", 4592);
    /// IAM.
    pub const IAM: Self = Self::new("iam", 4593);

    /// Every known service.
    pub const ALL: [Self; 21] = [
        Self::API_GATEWAY,
        Self::KINESIS,
        Self::DYNAMODB,
        Self::DYNAMODB_STREAMS,
        Self::S3,
        Self::FIREHOSE,
        Self::LAMBDA,
        Self::SNS,
        Self::SQS,
        Self::REDSHIFT,
        Self::ELASTICSEARCH_SERVICE,
        Self::SES,
        Self::ROUTE53,
        Self::CLOUDFORMATION,
        Self::CLOUDWATCH,
        Self::SSM,
        Self::SECRETS_MANAGER,
        Self::STEP_FUNCTIONS,
        Self::CLOUDWATCH_LOGS,
        Self::STS,
        Self::IAM,
    ];

    /// A service listening on `port`.
    pub const fn new(name: &'static str, port: u16) -> Self {
        Self { name, port }
    }

    /// Look a known service up by its LocalStack name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|service| service.name == name)
    }

    /// The same service, reached through the edge port.
    pub const fn on_edge(self) -> Self {
        Self::new(self.name, EDGE_PORT)
    }

    /// `http://localhost:{port}`.
    pub fn endpoint_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
