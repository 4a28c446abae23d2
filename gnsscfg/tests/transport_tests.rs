use std::time::Duration;

use gnsscfg::{
    Catalog, Command, CommandKind, LinkError, PortSettings, SerialLink, TransmitOptions,
    TransmitResult, TransportDriver,
};

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Configure(u32),
    Write(Vec<u8>),
    Baud(u32),
}

/// Records every call in order
#[derive(Default)]
struct RecordingLink {
    events: Vec<Event>,
}

impl RecordingLink {
    fn writes(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }
}

impl SerialLink for RecordingLink {
    type Error = std::io::Error;

    fn configure(&mut self, settings: &PortSettings) -> Result<(), Self::Error> {
        self.events.push(Event::Configure(settings.baud_rate));
        Ok(())
    }

    fn write_all(
        &mut self,
        bytes: &[u8],
        _timeout: Option<Duration>,
    ) -> Result<(), LinkError<Self::Error>> {
        self.events.push(Event::Write(bytes.to_vec()));
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
        self.events.push(Event::Baud(baud_rate));
        Ok(())
    }
}

#[test]
fn test_repeated_writes_are_identical_and_ordered() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    let command = Command::disable("GLL").unwrap().compile();
    let result = driver.transmit(&command, &TransmitOptions::new(5)).unwrap();

    assert_eq!(
        result,
        TransmitResult::Sent {
            writes: 5,
            bytes: 5 * command.as_bytes().len(),
            baud_change: None,
        }
    );
    let writes = driver.link().writes();
    assert_eq!(writes.len(), 5);
    assert!(writes.iter().all(|w| *w == b"$PUBX,40,GLL,0,0,0,0*5C\r\n"));
}

#[test]
fn test_baud_change_follows_every_write() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    let command = Command::baud(115200).unwrap().compile();
    driver.transmit(&command, &TransmitOptions::new(3)).unwrap();

    let frame = b"$PUBX,41,1,3,3,115200,0*1C\r\n".to_vec();
    assert_eq!(
        driver.into_link().events,
        [
            Event::Configure(9600),
            Event::Write(frame.clone()),
            Event::Write(frame.clone()),
            Event::Write(frame),
            Event::Baud(115200),
        ]
    );
}

#[test]
fn test_ubx_frames_are_written_whole() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    let command = Command::save_all().unwrap().compile();
    let options = TransmitOptions::for_payload(&command.payload);
    driver.transmit(&command, &options).unwrap();

    let writes = driver.link().writes();
    assert_eq!(writes.len(), 3);
    for w in writes {
        assert_eq!(w.len(), 21);
        assert_eq!(&w[19..], &[0x1d, 0xab]);
    }
    assert_eq!(driver.session().baud_rate(), 9600);
}

#[test]
fn test_ubx_baud_change_does_not_move_local_port() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    let command = Command::ubx_baud(115200).unwrap().compile();
    assert_eq!(command.kind, CommandKind::UbxBinary);
    let result = driver.transmit(&command, &TransmitOptions::new(1)).unwrap();

    assert_eq!(result.baud_change(), None);
    assert_eq!(driver.session().baud_rate(), 9600);
}

#[test]
fn test_dry_run_touches_nothing() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    let options = TransmitOptions::new(5).with_dry_run(true);

    for command in Catalog::standard().unwrap().iter() {
        let result = driver.transmit(&command.compile(), &options).unwrap();
        match result {
            TransmitResult::DryRun { trace, .. } => assert!(trace.len() >= 5),
            other => panic!("unexpected result {:?}", other),
        }
    }
    assert_eq!(driver.link().events, [Event::Configure(9600)]);
    assert_eq!(driver.session().baud_rate(), 9600);
}

#[test]
fn test_standard_session_ends_at_new_baud() {
    let mut driver = TransportDriver::open(RecordingLink::default(), PortSettings::new(9600)).unwrap();
    for command in Catalog::standard().unwrap().iter() {
        let compiled = command.compile();
        let options = TransmitOptions::for_payload(&compiled.payload);
        driver.transmit(&compiled, &options).unwrap();
    }

    // 7 rate sentences and one baud sentence at 5 copies, two UBX frames at 3
    assert_eq!(driver.link().writes().len(), 8 * 5 + 2 * 3);
    assert_eq!(driver.session().baud_rate(), 115200);
}
