// Communication channels lock-free

use crate::messaging::notification::Notification;
use crate::sequencer::trigger::TriggerEvent;
use ringbuf::{HeapRb, traits::Split};

pub type TriggerProducer = ringbuf::HeapProd<TriggerEvent>;
pub type TriggerConsumer = ringbuf::HeapCons<TriggerEvent>;

/// SPSC queue carrying trigger events to the audio callback
pub fn create_trigger_channel(capacity: usize) -> (TriggerProducer, TriggerConsumer) {
    let rb = HeapRb::<TriggerEvent>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
