//! Configuration layouts of the supported services.

use crate::discovery::{IncludeSyntax, ServicePattern};

pub static NGINX: ServicePattern = ServicePattern {
    service: "nginx",
    markers: &[
        "usr/sbin/nginx",
        "usr/bin/nginx",
        "usr/local/nginx/sbin/nginx",
        "usr/share/nginx",
        "var/log/nginx",
    ],
    config_roots: &[
        "etc/nginx",
        "usr/local/nginx/conf",
        "usr/local/etc/nginx",
        "opt/bitnami/nginx/conf",
    ],
    file_names: &[
        "nginx.conf",
        "mime.types",
        "fastcgi_params",
        "proxy_params",
        "scgi_params",
        "uwsgi_params",
    ],
    extensions: &["conf"],
    anywhere_names: &["nginx.conf"],
    content_signatures: &[],
    include: Some(IncludeSyntax::Nginx),
};

pub static APACHE: ServicePattern = ServicePattern {
    service: "apache",
    markers: &[
        "usr/sbin/apache2",
        "usr/sbin/httpd",
        "usr/local/apache2/bin/httpd",
        "var/log/apache2",
        "var/log/httpd",
    ],
    config_roots: &[
        "etc/apache2",
        "etc/httpd",
        "usr/local/apache2/conf",
        "opt/bitnami/apache/conf",
    ],
    file_names: &["apache2.conf", "httpd.conf", "ports.conf", "envvars"],
    extensions: &["conf", "load"],
    anywhere_names: &["httpd.conf", "apache2.conf", ".htaccess"],
    content_signatures: &[],
    include: Some(IncludeSyntax::Apache),
};

pub static MYSQL: ServicePattern = ServicePattern {
    service: "mysql",
    markers: &[
        "usr/sbin/mysqld",
        "usr/bin/mysqld",
        "usr/sbin/mariadbd",
        "var/lib/mysql",
    ],
    config_roots: &["etc/mysql", "etc/my.cnf.d", "usr/local/mysql/etc"],
    file_names: &["my.cnf", "debian.cnf"],
    extensions: &["cnf"],
    anywhere_names: &["my.cnf", "mysqld.cnf", ".my.cnf"],
    content_signatures: &[],
    include: None,
};

pub static POSTGRESQL: ServicePattern = ServicePattern {
    service: "postgresql",
    markers: &[
        "usr/lib/postgresql",
        "usr/bin/postgres",
        "usr/local/bin/postgres",
        "usr/local/pgsql",
        "var/lib/postgresql",
    ],
    config_roots: &[
        "etc/postgresql",
        "var/lib/postgresql/data",
        "var/lib/pgsql/data",
        "usr/local/pgsql/data",
    ],
    file_names: &[
        "postgresql.conf",
        "postgresql.auto.conf",
        "pg_hba.conf",
        "pg_ident.conf",
    ],
    extensions: &[],
    anywhere_names: &["postgresql.conf", "pg_hba.conf"],
    content_signatures: &[],
    include: None,
};

pub static REDIS: ServicePattern = ServicePattern {
    service: "redis",
    markers: &[
        "usr/bin/redis-server",
        "usr/local/bin/redis-server",
        "usr/sbin/redis-server",
        "var/lib/redis",
    ],
    config_roots: &["etc/redis", "usr/local/etc/redis"],
    file_names: &["redis.conf", "sentinel.conf"],
    extensions: &["conf"],
    anywhere_names: &["redis.conf"],
    content_signatures: &[],
    include: None,
};

pub static MONGODB: ServicePattern = ServicePattern {
    service: "mongodb",
    markers: &["usr/bin/mongod", "usr/local/bin/mongod", "var/lib/mongodb"],
    config_roots: &[],
    file_names: &[],
    extensions: &[],
    anywhere_names: &["mongod.conf", "mongodb.conf"],
    content_signatures: &[],
    include: None,
};

pub static RABBITMQ: ServicePattern = ServicePattern {
    service: "rabbitmq",
    markers: &[
        "usr/lib/rabbitmq",
        "usr/sbin/rabbitmq-server",
        "opt/rabbitmq/sbin/rabbitmq-server",
        "var/lib/rabbitmq",
    ],
    config_roots: &["etc/rabbitmq", "opt/rabbitmq/etc/rabbitmq"],
    file_names: &[
        "rabbitmq.conf",
        "advanced.config",
        "rabbitmq-env.conf",
        "enabled_plugins",
    ],
    extensions: &["conf", "config"],
    anywhere_names: &["rabbitmq.conf"],
    content_signatures: &[],
    include: None,
};

pub static KAFKA: ServicePattern = ServicePattern {
    service: "kafka",
    markers: &[
        "opt/kafka/bin/kafka-server-start.sh",
        "usr/bin/kafka-server-start",
        "opt/bitnami/kafka",
    ],
    config_roots: &["opt/kafka/config", "etc/kafka", "opt/bitnami/kafka/config"],
    file_names: &["server.properties", "zookeeper.properties", "log4j.properties"],
    extensions: &["properties"],
    anywhere_names: &["server.properties"],
    content_signatures: &["broker.id", "node.id", "zookeeper.connect", "process.roles"],
    include: None,
};

pub static ELASTICSEARCH: ServicePattern = ServicePattern {
    service: "elasticsearch",
    markers: &["usr/share/elasticsearch", "var/lib/elasticsearch"],
    config_roots: &["etc/elasticsearch", "usr/share/elasticsearch/config"],
    file_names: &["elasticsearch.yml", "jvm.options", "log4j2.properties"],
    extensions: &["yml", "options"],
    anywhere_names: &["elasticsearch.yml"],
    content_signatures: &[],
    include: None,
};

pub static HAPROXY: ServicePattern = ServicePattern {
    service: "haproxy",
    markers: &["usr/sbin/haproxy", "usr/local/sbin/haproxy"],
    config_roots: &["etc/haproxy", "usr/local/etc/haproxy"],
    file_names: &["haproxy.cfg"],
    extensions: &["cfg"],
    anywhere_names: &["haproxy.cfg"],
    content_signatures: &[],
    include: None,
};

pub static SSHD: ServicePattern = ServicePattern {
    service: "sshd",
    markers: &["usr/sbin/sshd"],
    config_roots: &["etc/ssh"],
    file_names: &["sshd_config", "ssh_config"],
    extensions: &["conf"],
    anywhere_names: &["sshd_config"],
    content_signatures: &[],
    include: None,
};

pub static DOCKER: ServicePattern = ServicePattern {
    service: "docker",
    markers: &["usr/bin/dockerd", "usr/local/bin/dockerd"],
    config_roots: &["etc/docker"],
    file_names: &["daemon.json"],
    extensions: &[],
    anywhere_names: &["daemon.json"],
    content_signatures: &[
        "\"log-driver\"",
        "\"storage-driver\"",
        "\"insecure-registries\"",
        "\"registry-mirrors\"",
        "\"userns-remap\"",
        "\"live-restore\"",
    ],
    include: None,
};
