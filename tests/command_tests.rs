//! Integration tests for the typed command helpers.

use skstack_rs::skstack::mock::MockSerialPort;
use skstack_rs::{Addr64, ErrorCode, ErxudpDataFormat, Event, SkStackClient, SkStackError};
use std::net::Ipv6Addr;
use tokio_test::io::Builder;

const FE80: &str = "FE80:0000:0000:0000:021D:1290:1234:5678";

fn link_local() -> Ipv6Addr {
    "fe80::21d:1290:1234:5678".parse().unwrap()
}

fn client_with(input: &str) -> (SkStackClient<MockSerialPort>, MockSerialPort) {
    let port = MockSerialPort::new();
    port.queue_rx_data(input.as_bytes());
    (SkStackClient::new(port.clone()), port)
}

/// Tests SKINFO against a typical module reply.
#[tokio::test]
async fn test_sk_info() {
    let (mut client, port) =
        client_with(&format!("SKINFO\r\nEINFO {FE80} 001D129012345678 21 8888 FFFE\r\nOK\r\n"));

    let info = client.sk_info().await.unwrap();
    assert_eq!(port.get_tx_data(), b"SKINFO\r\n");
    assert_eq!(info.link_local_address.to_string().to_uppercase(), "FE80::21D:1290:1234:5678");
    assert_eq!(info.addr64.to_string(), "00:1D:12:90:12:34:56:78");
    assert_eq!(info.channel.number(), 33);
    assert_eq!(info.pan_id, 0x8888);
    assert_eq!(info.addr16, 0xFFFE);
}

/// Tests the version helpers.
#[tokio::test]
async fn test_sk_ver() {
    let (mut client, _) = client_with("SKVER\r\nEVER 1.2.10\r\nOK\r\nSKAPPVER\r\nEAPPVER rev26e\r\nOK\r\n");

    assert_eq!(client.sk_ver().await.unwrap(), "1.2.10");
    assert_eq!(client.sk_app_ver().await.unwrap(), "rev26e");
}

/// Tests reading and writing a register.
#[tokio::test]
async fn test_sk_sreg() {
    let (mut client, port) = client_with("SKSREG S02\r\nESREG 21\r\nOK\r\nSKSREG S02 22\r\nOK\r\n");

    assert_eq!(client.sk_sreg_get("S02").await.unwrap().as_ref(), b"21");
    client.sk_sreg_set("S02", "22").await.unwrap();
    assert_eq!(port.get_tx_data(), b"SKSREG S02\r\nSKSREG S02 22\r\n");
}

/// Tests that a FAIL status is turned into a device error.
#[tokio::test]
async fn test_fail_status() {
    let (mut client, _) = client_with("SKRESET\r\nFAIL ER10\r\n");

    let err = client.sk_reset().await.unwrap_err();
    let SkStackError::Device(device) = err else {
        panic!("expected device error, got {err:?}");
    };
    assert_eq!(device.code, ErrorCode::Er10);
    assert_eq!(device.code_text, "ER10");
    assert!(device.text.is_empty());
}

/// Tests SKLL64, whose reply has no status line.
#[tokio::test]
async fn test_sk_ll64() {
    let (mut client, _) = client_with(&format!("SKLL64 001D129012345678\r\n{FE80}\r\n"));

    let addr = client.sk_ll64(&Addr64::from_u64(0x001D_1290_1234_5678)).await.unwrap();
    assert_eq!(addr, link_local());
    assert!(client.buffered().is_empty());
}

/// Tests the table helpers, which read the event embedded in the response.
#[tokio::test]
async fn test_sk_table() {
    let mut input = format!("SKTABLE 1\r\nEADDR\r\n{FE80}\r\nOK\r\n");
    input.push_str(&format!("SKTABLE 2\r\nENEIGHBOR\r\n{FE80} 001D129012345678 FFFE\r\nOK\r\n"));
    input.push_str("SKTABLE E\r\nEPORT\r\n3610\r\n0\r\n0\r\n0\r\n0\r\n0\r\n\r\n0\r\n0\r\n0\r\n0\r\nOK\r\n");
    let (mut client, _) = client_with(&input);

    assert_eq!(client.sk_table_addresses().await.unwrap(), vec![link_local()]);

    let neighbors = client.sk_table_neighbors().await.unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].addr16, 0xFFFE);
    assert_eq!(neighbors[0].addr64, Addr64::from_u64(0x001D_1290_1234_5678));

    let ports = client.sk_table_ports().await.unwrap();
    assert_eq!(ports.udp, [3610, 0, 0, 0, 0, 0]);
    assert_eq!(ports.tcp, [0; 4]);
}

/// Tests that an EPORT table with the wrong number of entries is rejected.
#[tokio::test]
async fn test_sk_table_ports_item_count() {
    let (mut client, _) = client_with("SKTABLE E\r\nEPORT\r\n3610\r\n0\r\nOK\r\n");

    let err = client.sk_table_ports().await.unwrap_err();
    assert!(matches!(err, SkStackError::Protocol(_)));
}

/// Tests the bytes written by SKSENDTO and the completion event in its reply.
#[tokio::test]
async fn test_sk_send_to() {
    let (mut client, port) = client_with(&format!(
        "SKSENDTO 1 {FE80} 0E1A 1 0005 \r\nEVENT 21 {FE80} 00\r\nOK\r\n"
    ));
    let mut events = client.subscribe();

    client
        .sk_send_to(1, &link_local(), 0x0E1A, true, b"hello")
        .await
        .unwrap();

    let expected = format!("SKSENDTO 1 {FE80} 0E1A 1 0005 hello");
    assert_eq!(port.get_tx_data(), expected.as_bytes());
    assert!(matches!(events.try_recv(), Ok(Event::Notification(_))));
}

/// Tests that secrets reach the wire unmasked.
#[tokio::test]
async fn test_sk_set_pwd() {
    let (mut client, port) = client_with("SKSETPWD C 0123456789AB\r\nOK\r\n");

    client.sk_set_pwd(b"0123456789AB").await.unwrap();
    assert_eq!(port.get_tx_data(), b"SKSETPWD C 0123456789AB\r\n");
}

/// Tests that the ERXUDP data format follows ROPT and WOPT.
#[tokio::test]
async fn test_ropt_and_wopt() {
    let mock = Builder::new()
        .write(b"ROPT\r")
        .read(b"ROPT\rOK 01\r")
        .write(b"WOPT 00\r")
        .read(b"WOPT 00\r")
        .read(b"OK\r")
        .build();
    let mut client = SkStackClient::new(mock);

    assert_eq!(client.ropt().await.unwrap(), ErxudpDataFormat::HexAscii);
    assert_eq!(client.options().erxudp_data_format, ErxudpDataFormat::HexAscii);

    client.wopt(ErxudpDataFormat::Binary).await.unwrap();
    assert_eq!(client.options().erxudp_data_format, ErxudpDataFormat::Binary);
}
