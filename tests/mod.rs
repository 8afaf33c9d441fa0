// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Two-peer scenarios driven through a Link.

#![cfg(test)]

use mailbox_driver::registers::*;
use mailbox_driver::{dispatch, AbortState, Link};
use mailbox_interface::*;

fn assert_idle(link: &Link<4>) {
    let mailbox = link.mailbox();
    let client = link.client();
    assert_eq!(mailbox.abort_state(), AbortState::Idle);
    assert_eq!(client.abort_state(), AbortState::Idle);
    let wires = link.wires();
    assert!(!wires.mailbox.abort);
    assert!(!wires.client.abort);
}

#[test]
fn abort_race() {
    let link = Link::<4>::new();
    assert!(link.mailbox().write(1).is_ok());
    assert!(link.mailbox().write(2).is_ok());
    link.mailbox().abort();
    link.client().abort();

    link.step();
    link.step();
    assert_idle(&link);
    {
        let mailbox = link.mailbox();
        let client = link.client();
        assert!(mailbox.abort_ack() != client.abort_ack());
        assert_eq!(mailbox.tx_words(), 0);
        assert_eq!(mailbox.rx_words(), 0);
        assert!(!client.readable());
    }

    // No ping-pong.
    for _ in 0..8 {
        link.step();
        assert_idle(&link);
    }
}

// The request is issued on step 1; both sides are idle after step 3, two
// steps after the request.
#[test]
fn mailbox_abort_idle_two_steps_after_request() {
    let link = Link::<4>::new();
    assert!(link.mailbox().write(0x11).is_ok());
    link.mailbox().abort();

    link.step();
    assert_eq!(link.mailbox().abort_state(), AbortState::Req);
    {
        let mut client = link.client();
        assert_eq!(client.abort_state(), AbortState::Ack);
        assert!(client.irq_pending().contains(IrqSource::ABORT_INIT));
        client.ack_irq(IrqSource::ABORT_INIT);
        client.abort();
    }
    link.step();
    assert_eq!(link.client().abort_state(), AbortState::Idle);
    assert!(link.client().abort_ack());
    link.step();
    assert_idle(&link);
    assert!(link.mailbox().irq_pending().contains(IrqSource::ABORT_DONE));
    assert!(!link.mailbox().abort_ack());
    assert_eq!(link.mailbox().tx_words(), 0);

    for _ in 0..8 {
        link.step();
        assert_idle(&link);
    }
}

#[test]
fn client_abort_idle_two_steps_after_request() {
    let link = Link::<4>::new();
    link.client().abort();

    link.step();
    assert_eq!(link.client().abort_state(), AbortState::Req);
    assert_eq!(link.mailbox().abort_state(), AbortState::Idle);
    link.step();
    {
        let mut mailbox = link.mailbox();
        assert_eq!(mailbox.abort_state(), AbortState::Ack);
        assert!(mailbox.irq_pending().contains(IrqSource::ABORT_INIT));
        mailbox.abort();
    }
    link.step();
    assert_eq!(link.mailbox().abort_state(), AbortState::Idle);
    assert_eq!(link.client().abort_state(), AbortState::Idle);
    assert!(link.mailbox().abort_ack());
    assert!(link.client().irq_pending().contains(IrqSource::ABORT_DONE));
    // The answer is a one-step pulse.
    assert!(link.wires().mailbox.abort);
    link.step();
    assert_idle(&link);

    for _ in 0..8 {
        link.step();
        assert_idle(&link);
    }
}

// Requests on every combination of nearby steps end with exactly one side
// holding abort_ack.
#[test]
fn abort_ack_unique_for_any_request_offset() {
    for mailbox_at in 0..3 {
        for client_at in 0..3 {
            let link = Link::<4>::new();
            for step in 0..10 {
                if step == mailbox_at {
                    link.mailbox().abort();
                }
                if step == client_at {
                    link.client().abort();
                }
                link.step();
            }
            assert_idle(&link);
            let mailbox = link.mailbox();
            let client = link.client();
            assert!(
                mailbox.abort_ack() != client.abort_ack(),
                "mailbox at {}, client at {}",
                mailbox_at,
                client_at
            );
        }
    }
}

#[test]
fn packet_with_done() {
    let link = Link::<4>::new();
    link.client().set_irq_enable(IrqSource::AVAILABLE);
    assert_eq!(link.mailbox().send_packet(&[0xA, 0xB, 0xC, 0xD]), Ok(()));

    // `available` must not fire before the whole packet is visible.
    let mut got = [0; 4];
    let mut n = 0;
    for _ in 0..12 {
        link.step();
        let mut client = link.client();
        let visible = n + client.rx_words();
        assert!(visible == 4 || !client.irq_pending().contains(IrqSource::AVAILABLE));
        if let Ok(word) = client.consume() {
            got[n] = word;
            n += 1;
        }
    }
    assert_eq!(n, 4);
    assert_eq!(got, [0xA, 0xB, 0xC, 0xD]);
    {
        let mut client = link.client();
        assert!(client.irq_line());
        client.ack_irq(IrqSource::AVAILABLE);
        assert!(!client.irq_line());
        assert_eq!(client.read_status() & (1 << CLIENT_STATUS_RX_AVAIL_BIT), 0);
    }
    assert_eq!(link.mailbox().tx_words(), 0);
    assert!(!link.mailbox().status().tx_err);
}

#[test]
fn client_to_mailbox() {
    let link = Link::<4>::new();
    for word in [5, 6, 7] {
        while link.client().write(word).is_err() {
            link.step();
        }
        link.step();
    }
    link.client().mark_done();
    link.run(4);
    let mut mailbox = link.mailbox();
    assert!(mailbox.irq_pending().contains(IrqSource::AVAILABLE));
    let mut buf = [0; 4];
    assert_eq!(mailbox.recv_packet(&mut buf), 3);
    assert_eq!(&buf[..3], &[5, 6, 7]);
}

#[test]
fn full_inbound_fifo_stalls_client() {
    let link = Link::<4>::new();
    for word in 0..6 {
        while link.client().write(word).is_err() {
            link.step();
            if link.mailbox().rx_words() == 4 {
                break;
            }
        }
        link.step();
    }
    link.run(4);
    // The mailbox never accepted more than it had room for.
    assert_eq!(link.mailbox().rx_words(), 4);
    assert!(!link.wires().mailbox.ready);
    assert!(link.client().tx_words() > 0);
    assert_eq!(link.mailbox().drain(), 4);
    link.run(3);
    assert!(link.mailbox().rx_words() > 0);
}

#[test]
fn error_irq_fires_once() {
    let link = Link::<4>::new();
    link.mailbox().set_irq_enable(IrqSource::ERROR);
    assert_eq!(link.mailbox().consume(), Err(MailboxError::QueueEmpty));
    assert!(link.mailbox().irq_line());
    link.mailbox().ack_irq(IrqSource::ERROR);

    for _ in 0..4 {
        assert!(link.mailbox().consume().is_err());
        link.step();
        assert!(!link.mailbox().irq_line());
    }
    let status = link.mailbox().read_status();
    assert_ne!(status & (1 << STATUS_RX_ERR_BIT), 0);

    assert!(link.mailbox().consume().is_err());
    assert!(link.mailbox().irq_line());
}

#[test]
fn loopback_self_test() {
    let link = Link::<4>::new();
    {
        let mut mailbox = link.mailbox();
        assert_eq!(mailbox.write_register(0x20, 1 << LOOPBACK_ENABLE_BIT), Ok(()));
        assert_eq!(mailbox.write_register(0x00, 0xFEED), Ok(()));
        assert_eq!(mailbox.write_register(0x08, 1 << DONE_DONE_BIT), Ok(()));
    }
    link.run(4);
    assert_eq!(link.wires().mailbox, LinkSignals::default());
    assert!(!link.client().readable());
    assert_eq!(link.mailbox().loopback_client().consume(), Ok(0xFEED));

    assert_eq!(link.mailbox().write_register(0x20, 0), Ok(()));
    assert!(!link.mailbox().loopback_client().readable());
}

#[test]
fn dispatch_over_link() {
    let link = Link::<4>::new();
    let mut request = [0u8; MAILBOX_REQUEST_DATA_SIZE];
    let mut reply = [0u8; 16];

    let encoded = postcard::to_slice(&MailboxRequest::Write(0x99), &mut request[..]).unwrap();
    assert_eq!(dispatch(&mut *link.client(), encoded, &mut reply), Ok(0));
    link.run(2);

    let encoded = postcard::to_slice(&MailboxRequest::Read, &mut request[..]).unwrap();
    let len = dispatch(&mut *link.mailbox(), encoded, &mut reply).unwrap();
    let response: ReadResponse = postcard::from_bytes(&reply[..len]).unwrap();
    assert_eq!(response.word, 0x99);

    let encoded = postcard::to_slice(&MailboxRequest::Status, &mut request[..]).unwrap();
    let len = dispatch(&mut *link.mailbox(), encoded, &mut reply).unwrap();
    let response: StatusResponse = postcard::from_bytes(&reply[..len]).unwrap();
    assert_eq!(response.status & STATUS_WORDS_MASK, 0);
}
